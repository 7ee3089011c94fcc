//! Kimoto Gravity Well retarget.
//!
//! Walks back from the previous header, keeping a running average of past
//! targets and the ratio between expected and observed elapsed time. The walk
//! stops once the ratio leaves the "event horizon", a band that narrows as
//! more headers are included, or when a hard cutoff height is reached.

use crate::compact::{bits_to_target, target_to_bits};
use crate::errors::DifficultyError;
use crate::source::HeaderSource;
use consensus_core::constants::{MAX_TARGET, PRE_VERTHASH_MAX_TARGET};
use consensus_core::BlockHeight;
use primitive_types::{U256, U512};

pub const TARGET_SPACING_SECS: i64 = 150;
/// Six hours of headers
pub const PAST_BLOCKS_MIN: i64 = 144;
/// Seven days of headers
pub const PAST_BLOCKS_MAX: i64 = 4032;
/// The walk never reads past these heights (protocol switches)
pub const CUTOFF_HEIGHTS: [BlockHeight; 2] = [1_080_000, 1_500_000];
/// From here on the ceiling is the Verthash-era limit
pub const VERTHASH_HEIGHT: BlockHeight = 1_500_000;

/// Allowed deviation of the adjustment ratio after `mass` headers.
pub fn event_horizon_deviation(mass: i64) -> f64 {
    1.0 + 0.7084 * (mass as f64 / PAST_BLOCKS_MIN as f64).powf(-1.228)
}

fn decode(bits: u32) -> Result<U256, DifficultyError> {
    Ok(bits_to_target(bits)?)
}

pub fn gravity_well<S: HeaderSource>(height: BlockHeight, source: &mut S) -> Result<(u32, U256), S::Error> {
    let last_index = height - 1;
    if last_index <= 0 || last_index < PAST_BLOCKS_MIN {
        let bits = target_to_bits(MAX_TARGET);
        return Ok((bits, decode(bits)?));
    }

    let last = source.require(last_index)?;
    let mut reading_index = last_index;
    let mut average = U256::zero();
    let mut actual_secs: i64 = 0;
    let mut target_secs: i64 = 0;

    for mass in 1..=PAST_BLOCKS_MAX {
        let reading = source.require(reading_index)?;
        let reading_target = decode(reading.bits)?;

        average = if mass == 1 {
            reading_target
        } else if reading_target >= average {
            average + (reading_target - average) / U256::from(mass as u64)
        } else {
            average - (average - reading_target) / U256::from(mass as u64)
        };

        actual_secs = (last.timestamp as i64 - reading.timestamp as i64).max(0);
        target_secs = TARGET_SPACING_SECS * mass;
        let ratio = if actual_secs != 0 {
            target_secs as f64 / actual_secs as f64
        } else {
            1.0
        };

        let deviation = event_horizon_deviation(mass);
        if mass >= PAST_BLOCKS_MIN && (ratio <= 1.0 / deviation || ratio >= deviation) {
            break;
        }
        if reading_index < 1 || CUTOFF_HEIGHTS.contains(&reading_index) {
            break;
        }
        reading_index -= 1;
    }

    let mut new_target = U512::from(average);
    if actual_secs != 0 && target_secs != 0 {
        new_target = new_target * U512::from(actual_secs as u64) / U512::from(target_secs as u64);
    }

    let ceiling = if last_index >= VERTHASH_HEIGHT { MAX_TARGET } else { PRE_VERTHASH_MAX_TARGET };
    let new_target = if new_target > U512::from(ceiling) {
        ceiling
    } else {
        U256::try_from(new_target).unwrap_or(ceiling)
    };

    let bits = target_to_bits(new_target);
    Ok((bits, decode(bits)?))
}
