use crate::BlockHeight;
use primitive_types::U256;

/// Serialized header size in bytes
pub const HEADER_SIZE: usize = 80;

/// Headers per chunk; also the classic retarget period
pub const CHUNK_SIZE: BlockHeight = 2016;

/// Proof-of-work limit from the Verthash era onward (0x7fff...ff)
pub const MAX_TARGET: U256 = U256([u64::MAX, u64::MAX, u64::MAX, 0x7fff_ffff_ffff_ffff]);

/// Proof-of-work limit before the Verthash switch (0x00000fff...ff)
pub const PRE_VERTHASH_MAX_TARGET: U256 = U256([u64::MAX, u64::MAX, u64::MAX, 0x0000_0fff_ffff_ffff]);

/// Difficulty of the genesis era, also used at several fork heights
pub const GENESIS_BITS: u32 = 0x1e0f_fff0;

/// Minimum difficulty used on simulation networks
pub const SIMNET_POW_BITS: u32 = 0x207f_ffff;

/// A tip older than this is considered stale (8 hours)
pub const STALE_TIP_DELAY_SECS: u64 = 8 * 60 * 60;
