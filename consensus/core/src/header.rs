use crate::constants::HEADER_SIZE;
use crate::errors::HeaderError;
use crate::{hashing, BlockHeight, Hash};
use serde::{Deserialize, Serialize};

/// An 80-byte block header.
///
/// `height` is not part of the wire encoding; it is attached when the record is
/// read from a known position (a chain file offset or a chunk index).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub prev_hash: Hash,
    pub merkle_root: Hash,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
    pub height: BlockHeight,
}

impl Header {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: u32,
        prev_hash: Hash,
        merkle_root: Hash,
        timestamp: u32,
        bits: u32,
        nonce: u32,
        height: BlockHeight,
    ) -> Self {
        Self { version, prev_hash, merkle_root, timestamp, bits, nonce, height }
    }

    /// Wire encoding: integers little-endian, hashes in internal byte order.
    pub fn serialize(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.version.to_le_bytes());
        out[4..36].copy_from_slice(self.prev_hash.as_bytes());
        out[36..68].copy_from_slice(self.merkle_root.as_bytes());
        out[68..72].copy_from_slice(&self.timestamp.to_le_bytes());
        out[72..76].copy_from_slice(&self.bits.to_le_bytes());
        out[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        out
    }

    pub fn deserialize(bytes: &[u8], height: BlockHeight) -> Result<Self, HeaderError> {
        if bytes.is_empty() {
            return Err(HeaderError::Empty);
        }
        if bytes.len() != HEADER_SIZE {
            return Err(HeaderError::InvalidLength(bytes.len()));
        }
        let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        let hash_at = |i: usize| {
            let mut h = [0u8; 32];
            h.copy_from_slice(&bytes[i..i + 32]);
            Hash::from_bytes(h)
        };
        Ok(Self {
            version: u32_at(0),
            prev_hash: hash_at(4),
            merkle_root: hash_at(36),
            timestamp: u32_at(68),
            bits: u32_at(72),
            nonce: u32_at(76),
            height,
        })
    }

    pub fn from_hex(s: &str, height: BlockHeight) -> Result<Self, HeaderError> {
        let bytes = hex::decode(s.trim()).map_err(|e| HeaderError::InvalidHex(e.to_string()))?;
        Self::deserialize(&bytes, height)
    }

    /// Block identity: double SHA-256 of the serialized header.
    pub fn hash(&self) -> Hash {
        hashing::header::hash(self)
    }

    /// Copy of this header placed at another height.
    pub fn at_height(&self, height: BlockHeight) -> Self {
        Self { height, ..self.clone() }
    }
}
