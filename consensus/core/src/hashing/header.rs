use crate::header::Header;
use crate::{Hash, ZERO_HASH};
use crypto_hashes::double_sha256;

/// Computes the hash of a block header
pub fn hash(header: &Header) -> Hash {
    hash_raw(&header.serialize())
}

/// Hash of an optional header; `None` stands for "no block" and hashes to zero.
pub fn hash_opt(header: Option<&Header>) -> Hash {
    header.map(hash).unwrap_or(ZERO_HASH)
}

/// Hash of an already-serialized header record.
pub fn hash_raw(raw: &[u8]) -> Hash {
    Hash::from_bytes(double_sha256(raw))
}
