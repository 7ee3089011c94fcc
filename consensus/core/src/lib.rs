//! Core types shared by the header-chain crates: the 80-byte header record,
//! network parameters, checkpoints and protocol constants.

pub mod config;
pub mod constants;
pub mod errors;
pub mod hashing;
pub mod header;
pub mod network;

pub use crypto_hashes::{Hash, ZERO_HASH};
pub use primitive_types::U256;

/// Block height. Signed because height -1 names the virtual block before genesis.
pub type BlockHeight = i64;

pub use config::checkpoints::Checkpoint;
pub use config::params::Params;
pub use errors::HeaderError;
pub use header::Header;
pub use network::NetworkType;
