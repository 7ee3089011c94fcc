//! Mainnet retarget rules exercised through a chain's own header files.
//!
//! Mainnet work cannot be mined in a test, so proof of work is stubbed out and
//! only the bits each header must carry are checked.

use consensus::{ChainError, ChainRegistry};
use consensus_core::constants::{CHUNK_SIZE, GENESIS_BITS};
use consensus_core::{Hash, Header, Params, ZERO_HASH};
use consensus_pow::{bits_to_target, target_to_bits, VerificationError};
use crypto_hashes::{HashError, PowAlgorithm, PowHasher};
use database::HeadersDir;
use primitive_types::U256;
use std::sync::Arc;
use tempfile::TempDir;

const START: u32 = 1_400_000_000;

/// Every header meets any target.
struct AcceptAll;

impl PowHasher for AcceptAll {
    fn pow_hash(&self, _algorithm: PowAlgorithm, _header: &[u8], _timestamp: u32) -> Result<Hash, HashError> {
        Ok(Hash::zeroed())
    }
}

/// `count` headers from genesis, `spacing` seconds apart, all at `bits`.
fn mainnet_headers(count: usize, spacing: u32, bits: u32) -> Vec<Header> {
    let mut last = Header::new(1, ZERO_HASH, Hash::from_bytes([0x11; 32]), START, GENESIS_BITS, 0, 0);
    let mut headers = vec![last.clone()];
    while headers.len() < count {
        last = Header::new(1, last.hash(), Hash::from_bytes([0x22; 32]), last.timestamp + spacing, bits, 0, last.height + 1);
        headers.push(last.clone());
    }
    headers
}

fn follow(prev: &Header, count: usize, spacing: u32, bits: u32) -> Vec<Header> {
    let mut headers = Vec::with_capacity(count);
    let mut last = prev.clone();
    for _ in 0..count {
        last = Header::new(1, last.hash(), Hash::from_bytes([0x33; 32]), last.timestamp + spacing, bits, 0, last.height + 1);
        headers.push(last.clone());
    }
    headers
}

fn raw(headers: &[Header]) -> Vec<u8> {
    headers.iter().flat_map(|h| h.serialize()).collect()
}

fn open(tmp: &TempDir, genesis: &Header) -> ChainRegistry {
    let params = Params::mainnet().with_genesis(genesis.hash());
    let dir = HeadersDir::open(tmp.path().join("headers")).unwrap();
    ChainRegistry::open_with_hasher(params, dir, Arc::new(AcceptAll)).unwrap()
}

#[test]
fn legacy_retarget_at_first_boundary() {
    let tmp = TempDir::new().unwrap();
    // the first period ran twice as fast as intended
    let headers = mainnet_headers(CHUNK_SIZE as usize, 75, GENESIS_BITS);
    let registry = open(&tmp, &headers[0]);
    let main = registry.best_chain().unwrap();
    assert!(main.connect_chunk(&registry, 0, &hex::encode(raw(&headers))).unwrap());
    assert_eq!(main.height(), 2015);

    let elapsed = U256::from(2015u64 * 75);
    let expected_bits = target_to_bits(bits_to_target(GENESIS_BITS).unwrap() * elapsed / U256::from(302_400u64));
    assert_ne!(expected_bits, GENESIS_BITS);

    let stale = follow(&headers[2015], 1, 150, GENESIS_BITS);
    assert!(!main.can_connect(&registry, &stale[0], true));
    let retargeted = follow(&headers[2015], CHUNK_SIZE as usize, 150, expected_bits);
    assert!(main.can_connect(&registry, &retargeted[0], true));

    // inside the period the new bits carry over
    assert!(main.verify_chunk(&registry, 1, &raw(&retargeted)).is_ok());
    let mut wrong = retargeted.clone();
    wrong[984] = Header { bits: GENESIS_BITS, ..wrong[984].clone() };
    let err = main.verify_chunk(&registry, 1, &raw(&wrong[..985])).unwrap_err();
    assert!(matches!(
        err,
        ChainError::Verification { height: 3000, source: VerificationError::BitsMismatch { .. } }
    ));
}

#[test]
fn gravity_well_after_legacy_era() {
    let tmp = TempDir::new().unwrap();
    // heights 0..=26753: the whole legacy era, evenly spaced at constant bits
    let headers = mainnet_headers(26_754, 150, GENESIS_BITS);
    let registry = open(&tmp, &headers[0]);
    let main = registry.best_chain().unwrap();
    for (index, chunk) in headers.chunks(CHUNK_SIZE as usize).enumerate() {
        main.save_chunk(&registry, index as i64, &raw(chunk)).unwrap();
    }
    assert_eq!(main.height(), 26_753);

    // a full 4032-header window at exact spacing: average target scaled by
    // 4031 observed over 4032 expected intervals
    let target = bits_to_target(GENESIS_BITS).unwrap();
    let expected_bits = target_to_bits(target * U256::from(4031u64) / U256::from(4032u64));

    let next = follow(&headers[26_753], 1, 150, expected_bits);
    assert!(main.can_connect(&registry, &next[0], true));
    assert_ne!(expected_bits, GENESIS_BITS);
    let unadjusted = follow(&headers[26_753], 1, 150, GENESIS_BITS);
    assert!(!main.can_connect(&registry, &unadjusted[0], true));

    main.save_header(&registry, &next[0]).unwrap();
    assert_eq!(main.height(), 26_754);
}
