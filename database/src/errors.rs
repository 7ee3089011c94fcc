use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("headers directory {0} does not exist. Was it deleted while running?")]
    HeadersDirMissing(PathBuf),

    #[error("cannot find headers file but headers directory is there. Should be at {0}")]
    FileMissing(PathBuf),

    #[error("expected to read a full header at byte {offset} of {path}")]
    Truncated { path: PathBuf, offset: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// The on-disk store vanished under us; nothing stored can be trusted.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, DbError::HeadersDirMissing(_) | DbError::FileMissing(_))
    }
}

pub type DbResult<T> = Result<T, DbError>;
