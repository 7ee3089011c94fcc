use crate::chain::ChainHandle;
use consensus_core::{BlockHeight, Hash, HeaderError};
use consensus_pow::{DifficultyError, VerificationError};
use database::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("missing header at height {0}")]
    MissingHeader(BlockHeight),

    #[error(transparent)]
    InvalidHeader(#[from] HeaderError),

    #[error("header at height {height} failed verification: {source}")]
    Verification {
        height: BlockHeight,
        #[source]
        source: VerificationError,
    },

    #[error(transparent)]
    Difficulty(#[from] DifficultyError),

    #[error("headers are only appended: expected height {expected}, got {actual}")]
    NotNextHeader { expected: BlockHeight, actual: BlockHeight },

    #[error("invalid chunk index {0}")]
    InvalidChunkIndex(BlockHeight),

    #[error("cannot fork below max checkpoint. forkpoint: {forkpoint}, max checkpoint: {max_checkpoint}")]
    ForkBelowCheckpoint { forkpoint: BlockHeight, max_checkpoint: BlockHeight },

    #[error("forking header at height {0} does not connect to parent chain")]
    DoesNotConnect(BlockHeight),

    #[error("unknown chain {0}")]
    UnknownChain(ChainHandle),

    #[error("no chain with id {0}")]
    UnknownChainId(Hash),

    #[error("storage unavailable: {0}")]
    Storage(#[from] DbError),

    #[error("reorg invariant violated: {0}")]
    ReorgInvariantViolation(String),
}

impl ChainError {
    /// Storage failures and broken reorg invariants leave the header store in
    /// an unknown state. Everything else is a rejected input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ChainError::Storage(_) | ChainError::ReorgInvariantViolation(_) | ChainError::UnknownChain(_))
    }
}

pub type ChainResult<T> = std::result::Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn fatal_split() {
        assert!(ChainError::Storage(DbError::FileMissing(PathBuf::from("x"))).is_fatal());
        assert!(ChainError::ReorgInvariantViolation("loop".into()).is_fatal());
        assert!(!ChainError::MissingHeader(5).is_fatal());
        assert!(!ChainError::from(HeaderError::Empty).is_fatal());
        assert!(!ChainError::from(DifficultyError::MissingHeader(3)).is_fatal());
        let verification = ChainError::Verification {
            height: 7,
            source: VerificationError::BitsMismatch { expected: 1, actual: 2 },
        };
        assert!(!verification.is_fatal());
        assert!(verification.to_string().contains("height 7"));
    }
}
