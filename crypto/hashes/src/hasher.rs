use crate::pow_hash::PowAlgorithm;
use sha2::{Digest, Sha256};

#[derive(Debug)]
pub enum HashError {
    DecodingError(&'static str),
    UnsupportedAlgorithm(PowAlgorithm),
    InvalidParams(String),
}

impl std::fmt::Display for HashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashError::DecodingError(msg) => write!(f, "Hash decoding error: {}", msg),
            HashError::UnsupportedAlgorithm(algo) => write!(f, "PoW algorithm {} is not available in this hasher", algo),
            HashError::InvalidParams(msg) => write!(f, "Invalid PoW hash parameters: {}", msg),
        }
    }
}

impl std::error::Error for HashError {}

/// Compute SHA256(SHA256(data))
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    second.into()
}

/// Compute SHA256(data)
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_double_sha256() {
        let data = b"hello";
        let hash = double_sha256(data);
        assert_eq!(
            hash,
            hex!("9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50")
        );
    }

    #[test]
    fn test_sha256() {
        let hash = sha256(b"hello");
        assert_eq!(
            hash,
            hex!("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );
    }
}
