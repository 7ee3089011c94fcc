//! Trusted chunk checkpoints.
//!
//! Entry `i` describes chunk `i` (heights `i*2016 ..= i*2016+2015`): the hash of
//! its last header and the target every header in the chunk was mined at.
//! Stored as JSON, hashes in display hex and targets as `0x` hex.

use crate::errors::ParamsError;
use crate::Hash;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub hash: Hash,
    pub target: U256,
}

impl Checkpoint {
    pub fn new(hash: Hash, target: U256) -> Self {
        Self { hash, target }
    }
}

pub fn load_checkpoints(path: &Path) -> Result<Vec<Checkpoint>, ParamsError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_checkpoints(path: &Path, checkpoints: &[Checkpoint]) -> Result<(), ParamsError> {
    let content = serde_json::to_string_pretty(checkpoints)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn json_format_is_hex() {
        let cp = Checkpoint::new(Hash::from_bytes([1u8; 32]), U256::from(0x1234u64));
        let json = serde_json::to_string(&cp).unwrap();
        assert!(json.contains("\"target\":\"0x1234\""));
        assert!(json.contains(&cp.hash.to_string()));
    }

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("checkpoints.json");
        let cps = vec![
            Checkpoint::new(Hash::from_bytes([1u8; 32]), U256::from(7u64)),
            Checkpoint::new(Hash::from_bytes([2u8; 32]), U256::MAX >> 4),
        ];
        save_checkpoints(&path, &cps).unwrap();
        assert_eq!(load_checkpoints(&path).unwrap(), cps);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "[{\"hash\": 1}]").unwrap();
        assert!(matches!(load_checkpoints(&path), Err(ParamsError::Checkpoints(_))));
        assert!(matches!(load_checkpoints(&tmp.path().join("missing.json")), Err(ParamsError::IoError(_))));
    }
}
