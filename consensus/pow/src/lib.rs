//! Difficulty and proof-of-work rules for block headers.

pub mod compact;
pub mod errors;
pub mod kgw;
pub mod legacy;
pub mod rules;
pub mod source;
pub mod work;

pub use compact::{bits_to_target, target_to_bits};
pub use errors::{CompactError, DifficultyError, VerificationError};
pub use rules::{should_check_bits_target, DifficultySchedule, RetargetRule, RuleEntry};
pub use source::{HeaderSource, PendingHeaders};
pub use work::{work_from_bits, work_from_target};

use consensus_core::{Hash, Header, Params};
use crypto_hashes::{PowAlgorithm, PowHasher};
use primitive_types::U256;

/// PoW evaluation of a single header against a target.
pub struct State {
    pub(crate) target: U256,
    pub(crate) algorithm: PowAlgorithm,
    pub(crate) raw: [u8; 80],
    pub(crate) timestamp: u32,
}

impl State {
    #[inline]
    pub fn new(header: &Header, target: U256, params: &Params) -> Self {
        Self { target, algorithm: params.pow_algorithm(header.height), raw: header.serialize(), timestamp: header.timestamp }
    }

    /// The PoW hash read as a little-endian 256-bit integer.
    pub fn calculate_pow(&self, hasher: &dyn PowHasher) -> Result<U256, VerificationError> {
        let hash = hasher
            .pow_hash(self.algorithm, &self.raw, self.timestamp)
            .map_err(|e| VerificationError::PowUnavailable { algorithm: self.algorithm, reason: e.to_string() })?;
        Ok(U256::from_little_endian(hash.as_bytes()))
    }

    #[inline]
    pub fn check_pow(&self, hasher: &dyn PowHasher) -> Result<(bool, U256), VerificationError> {
        let pow = self.calculate_pow(hasher)?;
        // The pow hash must be less or equal than the required target.
        Ok((pow <= self.target, pow))
    }
}

/// Header-level checks: identity, linkage, and when `expected` is given,
/// bits and proof of work.
///
/// `expected` carries the required `(bits, target)`; `None` skips both checks.
/// Networks that skip PoW checks stop after linkage.
pub fn verify_header(
    header: &Header,
    prev_hash: &Hash,
    expected: Option<(u32, U256)>,
    expected_hash: Option<&Hash>,
    params: &Params,
    hasher: &dyn PowHasher,
) -> Result<(), VerificationError> {
    let hash = header.hash();
    if let Some(expected_hash) = expected_hash {
        if *expected_hash != hash {
            return Err(VerificationError::HashMismatch { expected: *expected_hash, actual: hash });
        }
    }
    if *prev_hash != header.prev_hash {
        return Err(VerificationError::PrevHashMismatch { expected: *prev_hash, actual: header.prev_hash });
    }
    if params.skip_pow_checks {
        return Ok(());
    }
    if let Some((bits, target)) = expected {
        if bits != header.bits {
            return Err(VerificationError::BitsMismatch { expected: bits, actual: header.bits });
        }
        let (passed, pow) = State::new(header, target, params).check_pow(hasher)?;
        if !passed {
            return Err(VerificationError::InsufficientProofOfWork { pow, target });
        }
    }
    Ok(())
}
