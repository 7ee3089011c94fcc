//! Compact ("nBits") target encoding.

use crate::errors::CompactError;
use primitive_types::U256;

/// Decodes compact bits into a 256-bit target (`SetCompact`).
pub fn bits_to_target(bits: u32) -> Result<U256, CompactError> {
    let size = bits >> 24;
    let mut word = bits & 0x007f_ffff;
    let negative = (bits & 0x0080_0000) != 0;

    if size <= 3 {
        word >>= 8 * (3 - size);
    }
    if word == 0 {
        return Ok(U256::zero());
    }
    if negative {
        return Err(CompactError::Negative(bits));
    }
    if size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32) {
        return Err(CompactError::Overflow(bits));
    }

    Ok(if size <= 3 { U256::from(word) } else { U256::from(word) << (8 * (size - 3) as usize) })
}

/// Encodes a target as compact bits (`GetCompact`).
pub fn target_to_bits(target: U256) -> u32 {
    if target.is_zero() {
        return 0;
    }

    let mut size = ((target.bits() + 7) / 8) as u32;
    let mut compact: u32 = if size <= 3 {
        target.low_u32() << (8 * (3 - size))
    } else {
        (target >> (8 * (size - 3) as usize)).low_u32()
    };

    if (compact & 0x0080_0000) != 0 {
        compact >>= 8;
        size += 1;
    }

    (size << 24) | (compact & 0x007f_ffff)
}
