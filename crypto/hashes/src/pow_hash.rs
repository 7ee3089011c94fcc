//! Proof-of-work hash functions.
//!
//! The ledger changed its PoW function several times. Which one applies to a
//! header is decided by height in consensus parameters; this module only knows
//! how to evaluate them.

use crate::{double_sha256, Hash, HashError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp the adaptive scrypt N-factor is measured from.
pub const SCRYPT_CHAIN_START_TIME: u32 = 1_389_306_217;
pub const SCRYPT_MIN_N_FACTOR: u8 = 10;
pub const SCRYPT_MAX_N_FACTOR: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowAlgorithm {
    /// Double SHA-256, used by simulation networks
    Sha256d,
    /// Scrypt with an N parameter that grows with the header timestamp
    ScryptN,
    Lyra2RE,
    Lyra2REv2,
    Lyra2REv3,
    Verthash,
}

impl fmt::Display for PowAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowAlgorithm::Sha256d => write!(f, "sha256d"),
            PowAlgorithm::ScryptN => write!(f, "scrypt-n"),
            PowAlgorithm::Lyra2RE => write!(f, "lyra2re"),
            PowAlgorithm::Lyra2REv2 => write!(f, "lyra2rev2"),
            PowAlgorithm::Lyra2REv3 => write!(f, "lyra2rev3"),
            PowAlgorithm::Verthash => write!(f, "verthash"),
        }
    }
}

/// Computes the PoW hash of a serialized header.
///
/// The result is in wire byte order, so it compares against a target when
/// read as a little-endian integer.
pub trait PowHasher: Send + Sync {
    fn pow_hash(&self, algorithm: PowAlgorithm, header: &[u8], timestamp: u32) -> Result<Hash, HashError>;
}

/// Hasher backed by pure-Rust primitives.
///
/// Lyra2 and Verthash need external implementations (Verthash also needs a
/// large data file); they are reported as unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPowHasher;

impl PowHasher for DefaultPowHasher {
    fn pow_hash(&self, algorithm: PowAlgorithm, header: &[u8], timestamp: u32) -> Result<Hash, HashError> {
        match algorithm {
            PowAlgorithm::Sha256d => Ok(Hash::from_bytes(double_sha256(header))),
            PowAlgorithm::ScryptN => scrypt_n_hash(header, timestamp),
            other => Err(HashError::UnsupportedAlgorithm(other)),
        }
    }
}

/// Adaptive N-factor for scrypt-N at the given header timestamp.
pub fn scrypt_n_factor(timestamp: u32) -> u8 {
    if timestamp <= SCRYPT_CHAIN_START_TIME {
        return SCRYPT_MIN_N_FACTOR;
    }
    let mut s = (timestamp - SCRYPT_CHAIN_START_TIME) as i64;
    let mut l: i64 = 0;
    while (s >> 1) > 3 {
        l += 1;
        s >>= 1;
    }
    s &= 3;
    let n = ((l * 158 + s * 28 - 2670) / 100).clamp(0, 255) as u8;
    n.clamp(SCRYPT_MIN_N_FACTOR, SCRYPT_MAX_N_FACTOR)
}

/// scrypt(header, header, N = 2^(nfactor + 1), r = 1, p = 1), 32 bytes out.
pub fn scrypt_n_hash(header: &[u8], timestamp: u32) -> Result<Hash, HashError> {
    let log_n = scrypt_n_factor(timestamp) + 1;
    let params = scrypt::Params::new(log_n, 1, 1, 32).map_err(|e| HashError::InvalidParams(e.to_string()))?;
    let mut out = [0u8; 32];
    scrypt::scrypt(header, header, &params, &mut out).map_err(|e| HashError::InvalidParams(e.to_string()))?;
    Ok(Hash::from_bytes(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n_factor_starts_at_minimum() {
        assert_eq!(scrypt_n_factor(0), SCRYPT_MIN_N_FACTOR);
        assert_eq!(scrypt_n_factor(SCRYPT_CHAIN_START_TIME), SCRYPT_MIN_N_FACTOR);
        assert_eq!(scrypt_n_factor(SCRYPT_CHAIN_START_TIME + 60), SCRYPT_MIN_N_FACTOR);
    }

    #[test]
    fn n_factor_grows_and_saturates() {
        let late = scrypt_n_factor(u32::MAX);
        assert!(late > SCRYPT_MIN_N_FACTOR);
        assert!(late <= SCRYPT_MAX_N_FACTOR);
        let mut prev = SCRYPT_MIN_N_FACTOR;
        for t in (SCRYPT_CHAIN_START_TIME..u32::MAX).step_by(50_000_000) {
            let f = scrypt_n_factor(t);
            assert!(f >= prev);
            prev = f;
        }
    }

    #[test]
    fn sha256d_matches_plain_function() {
        let data = [7u8; 80];
        let h = DefaultPowHasher.pow_hash(PowAlgorithm::Sha256d, &data, 0).unwrap();
        assert_eq!(h.as_bytes(), &double_sha256(&data));
    }

    #[test]
    fn scrypt_is_deterministic() {
        let data = [1u8; 80];
        let a = DefaultPowHasher.pow_hash(PowAlgorithm::ScryptN, &data, SCRYPT_CHAIN_START_TIME).unwrap();
        let b = scrypt_n_hash(&data, SCRYPT_CHAIN_START_TIME).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, Hash::from_bytes(double_sha256(&data)));
    }

    #[test]
    fn lyra_and_verthash_unsupported() {
        for algo in [PowAlgorithm::Lyra2RE, PowAlgorithm::Lyra2REv2, PowAlgorithm::Lyra2REv3, PowAlgorithm::Verthash] {
            let err = DefaultPowHasher.pow_hash(algo, &[0u8; 80], 0).unwrap_err();
            assert!(matches!(err, HashError::UnsupportedAlgorithm(a) if a == algo));
        }
    }
}
