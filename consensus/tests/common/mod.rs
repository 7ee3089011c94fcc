#![allow(dead_code)]

use consensus::ChainRegistry;
use consensus_core::constants::SIMNET_POW_BITS;
use consensus_core::{Checkpoint, Hash, Header, Params, ZERO_HASH};
use consensus_pow::bits_to_target;
use database::HeadersDir;
use primitive_types::U256;
use tempfile::TempDir;

pub const GENESIS_TIME: u32 = 1_600_000_000;

fn pow_passes(header: &Header) -> bool {
    let target = bits_to_target(SIMNET_POW_BITS).unwrap();
    U256::from_little_endian(header.hash().as_bytes()) <= target
}

/// Grinds the nonce until the header meets the simnet target.
pub fn mine(mut header: Header) -> Header {
    while !pow_passes(&header) {
        header.nonce += 1;
    }
    header
}

/// Grinds the nonce until the header misses the simnet target.
pub fn mine_weak(mut header: Header) -> Header {
    while pow_passes(&header) {
        header.nonce += 1;
    }
    header
}

pub fn genesis() -> Header {
    mine(Header::new(1, ZERO_HASH, Hash::from_bytes([0xaa; 32]), GENESIS_TIME, SIMNET_POW_BITS, 0, 0))
}

/// The header after `prev`; `branch` keeps sibling branches apart.
pub fn next(prev: &Header, branch: u8) -> Header {
    mine(Header::new(
        1,
        prev.hash(),
        Hash::from_bytes([branch; 32]),
        prev.timestamp + 150,
        SIMNET_POW_BITS,
        0,
        prev.height + 1,
    ))
}

/// `count` headers following `prev`.
pub fn extend(prev: &Header, count: usize, branch: u8) -> Vec<Header> {
    let mut headers = Vec::with_capacity(count);
    let mut last = prev.clone();
    for _ in 0..count {
        last = next(&last, branch);
        headers.push(last.clone());
    }
    headers
}

/// Genesis followed by `count` more headers.
pub fn main_headers(count: usize) -> Vec<Header> {
    let genesis = genesis();
    let mut headers = vec![genesis.clone()];
    headers.extend(extend(&genesis, count, 0));
    headers
}

pub fn encode(headers: &[Header]) -> String {
    let bytes: Vec<u8> = headers.iter().flat_map(|h| h.serialize()).collect();
    hex::encode(bytes)
}

pub fn simnet_params(genesis: &Header) -> Params {
    Params::simnet(genesis.hash())
}

pub fn checkpoint_for(last_in_chunk: &Header) -> Checkpoint {
    Checkpoint::new(last_in_chunk.hash(), bits_to_target(SIMNET_POW_BITS).unwrap())
}

pub struct TestNode {
    pub tmp: TempDir,
    pub registry: ChainRegistry,
}

impl TestNode {
    pub fn new(params: Params) -> Self {
        let tmp = TempDir::new().unwrap();
        let registry = open(&tmp, params);
        Self { tmp, registry }
    }

    /// Reopens the same headers directory, as after a restart.
    pub fn reopen(self, params: Params) -> Self {
        let registry = open(&self.tmp, params);
        Self { tmp: self.tmp, registry }
    }

    pub fn headers_dir(&self) -> HeadersDir {
        self.registry.dir().clone()
    }

    /// Saves headers one by one on the main chain.
    pub fn save_main(&self, headers: &[Header]) {
        let main = self.registry.best_chain().unwrap();
        for header in headers {
            main.save_header(&self.registry, header).unwrap();
        }
    }
}

fn open(tmp: &TempDir, params: Params) -> ChainRegistry {
    let dir = HeadersDir::open(tmp.path().join("headers")).unwrap();
    ChainRegistry::open(params, dir).unwrap()
}
