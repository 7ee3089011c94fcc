use consensus_core::{BlockHeight, Hash};
use crypto_hashes::PowAlgorithm;
use primitive_types::U256;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactError {
    #[error("compact target {0:#010x} has negative sign bit")]
    Negative(u32),

    #[error("compact target {0:#010x} overflows 256-bit range")]
    Overflow(u32),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DifficultyError {
    #[error(transparent)]
    Compact(#[from] CompactError),

    #[error("header at height {0} is required for retargeting but not available")]
    MissingHeader(BlockHeight),

    #[error("no checkpoint covers height {0}")]
    MissingCheckpoint(BlockHeight),
}

/// A header failed one of the header-level consensus checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("hash mismatches with expected: {expected} vs {actual}")]
    HashMismatch { expected: Hash, actual: Hash },

    #[error("prev hash mismatch: {expected} vs {actual}")]
    PrevHashMismatch { expected: Hash, actual: Hash },

    #[error("bits mismatch: {expected:#010x} vs {actual:#010x}")]
    BitsMismatch { expected: u32, actual: u32 },

    #[error("insufficient proof of work: {pow} vs target {target}")]
    InsufficientProofOfWork { pow: U256, target: U256 },

    #[error("cannot evaluate {algorithm} proof of work: {reason}")]
    PowUnavailable { algorithm: PowAlgorithm, reason: String },
}
