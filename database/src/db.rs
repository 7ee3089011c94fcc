use crate::errors::{DbError, DbResult};
use consensus_core::{BlockHeight, Hash};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MAIN_CHAIN_FILE: &str = "blockchain_headers";
pub const FORKS_DIR: &str = "forks";
pub const FORK_FILE_PREFIX: &str = "fork2_";

/// Identity of a fork file: `fork2_{forkpoint}_{prev_hash}_{first_hash}`,
/// hashes in display hex with leading zeros stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkFileName {
    pub forkpoint: BlockHeight,
    pub prev_hash: Hash,
    pub first_hash: Hash,
}

impl ForkFileName {
    pub fn new(forkpoint: BlockHeight, prev_hash: Hash, first_hash: Hash) -> Self {
        Self { forkpoint, prev_hash, first_hash }
    }

    /// Parses a directory entry; `None` for anything that is not a fork file.
    pub fn parse(name: &str) -> Option<Self> {
        if !name.starts_with(FORK_FILE_PREFIX) || name.contains('.') {
            return None;
        }
        let mut parts = name.split('_');
        let _prefix = parts.next()?;
        let forkpoint = parts.next()?.parse().ok()?;
        let prev_hash = Hash::from_stripped_hex(parts.next()?).ok()?;
        let first_hash = Hash::from_stripped_hex(parts.next()?).ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { forkpoint, prev_hash, first_hash })
    }
}

impl fmt::Display for ForkFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}_{}_{}",
            FORK_FILE_PREFIX,
            self.forkpoint,
            self.prev_hash.to_stripped_hex(),
            self.first_hash.to_stripped_hex()
        )
    }
}

/// The headers directory and its layout.
#[derive(Debug, Clone)]
pub struct HeadersDir {
    root: PathBuf,
}

impl HeadersDir {
    /// Opens `root`, creating it and its `forks/` subdirectory if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> DbResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(FORKS_DIR))?;
        debug!("opened headers directory {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn main_chain_path(&self) -> PathBuf {
        self.root.join(MAIN_CHAIN_FILE)
    }

    pub fn forks_dir(&self) -> PathBuf {
        self.root.join(FORKS_DIR)
    }

    pub fn fork_path(&self, name: &ForkFileName) -> PathBuf {
        self.forks_dir().join(name.to_string())
    }

    /// Fork files currently on disk, ordered by forkpoint.
    pub fn list_forks(&self) -> DbResult<Vec<ForkFileName>> {
        let mut forks = Vec::new();
        for entry in fs::read_dir(self.forks_dir())? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str().and_then(ForkFileName::parse) {
                forks.push(name);
            }
        }
        forks.sort_by_key(|f| f.forkpoint);
        Ok(forks)
    }

    /// Distinguishes "the headers directory is gone" from "this one file is
    /// gone"; both mean the store is no longer usable.
    pub fn ensure_available(&self, path: &Path) -> DbResult<()> {
        if path.exists() {
            Ok(())
        } else if !self.root.exists() {
            Err(DbError::HeadersDirMissing(self.root.clone()))
        } else {
            Err(DbError::FileMissing(path.to_path_buf()))
        }
    }
}
