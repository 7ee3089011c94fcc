use crate::compact::bits_to_target;
use crate::errors::CompactError;
use primitive_types::U256;

/// Expected number of hashes to find a header at `target`:
/// `floor((2^256 - target - 1) / (target + 1)) + 1`.
///
/// A zero target saturates to `U256::MAX`.
pub fn work_from_target(target: U256) -> U256 {
    match target.checked_add(U256::one()) {
        Some(divisor) => (!target / divisor).saturating_add(U256::one()),
        None => U256::one(),
    }
}

pub fn work_from_bits(bits: u32) -> Result<U256, CompactError> {
    Ok(work_from_target(bits_to_target(bits)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_targets() {
        assert_eq!(work_from_target(U256::MAX), U256::one());
        assert_eq!(work_from_target(U256::zero()), U256::MAX);
        // half the hash space: two expected attempts
        assert_eq!(work_from_target(U256::MAX >> 1), U256::from(2u64));
    }

    #[test]
    fn harder_target_means_more_work() {
        let easy = work_from_bits(0x207fffff).unwrap();
        let genesis = work_from_bits(0x1e0ffff0).unwrap();
        assert_eq!(easy, U256::from(2u64));
        assert!(genesis > easy);
        assert_eq!(genesis, U256::from(0x100010u64));
    }
}
