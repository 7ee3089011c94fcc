//! Classic retarget every 2016 headers, used for the early chain.

use crate::compact::{bits_to_target, target_to_bits};
use crate::errors::DifficultyError;
use crate::source::HeaderSource;
use consensus_core::constants::{CHUNK_SIZE, PRE_VERTHASH_MAX_TARGET};
use consensus_core::BlockHeight;
use primitive_types::{U256, U512};

/// 3.5 days: 2016 headers at 150 seconds
pub const LEGACY_TARGET_TIMESPAN: i64 = 84 * 60 * 60;

/// Required `(bits, target)` at `height` under the every-2016-headers rule.
///
/// Inside a period the previous header's bits carry over. At a boundary the
/// previous target is scaled by the time the period took, clamped to a factor
/// of four either way.
pub fn legacy_retarget<S: HeaderSource>(height: BlockHeight, source: &mut S) -> Result<(u32, U256), S::Error> {
    let last = source.require(height - 1)?;
    let target = bits_to_target(last.bits).map_err(DifficultyError::from)?;
    if height % CHUNK_SIZE != 0 {
        return Ok((last.bits, target));
    }

    // go back the full period unless it's the first retarget
    let first_height = if height > CHUNK_SIZE { height - CHUNK_SIZE - 1 } else { 0 };
    let first = source.require(first_height)?;

    let actual = (last.timestamp as i64 - first.timestamp as i64)
        .clamp(LEGACY_TARGET_TIMESPAN / 4, LEGACY_TARGET_TIMESPAN * 4);
    let scaled = target.full_mul(U256::from(actual as u64)) / U512::from(LEGACY_TARGET_TIMESPAN as u64);
    let new_target = if scaled > U512::from(PRE_VERTHASH_MAX_TARGET) {
        PRE_VERTHASH_MAX_TARGET
    } else {
        U256::try_from(scaled).unwrap_or(PRE_VERTHASH_MAX_TARGET)
    };

    let bits = target_to_bits(new_target);
    Ok((bits, bits_to_target(bits).map_err(DifficultyError::from)?))
}
