//! Cumulative chain work, memoized at chunk boundaries.

use crate::chain::HeaderChain;
use crate::errors::{ChainError, ChainResult};
use crate::registry::ChainRegistry;
use consensus_core::constants::CHUNK_SIZE;
use consensus_core::{BlockHeight, Hash, ZERO_HASH};
use consensus_pow::{bits_to_target, work_from_target, DifficultyError};
use parking_lot::RwLock;
use primitive_types::U256;
use std::collections::HashMap;

/// Block hash -> work up to and including that block.
///
/// Only hashes of the last header of a chunk are stored. Entries never go
/// stale: a chunk-boundary hash pins the whole history below it.
pub struct ChainworkCache {
    entries: RwLock<HashMap<Hash, U256>>,
}

impl ChainworkCache {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        // virtual block at height -1
        entries.insert(ZERO_HASH, U256::zero());
        Self { entries: RwLock::new(entries) }
    }

    pub fn get(&self, hash: &Hash) -> Option<U256> {
        self.entries.read().get(hash).copied()
    }

    pub fn insert(&self, hash: Hash, work: U256) {
        self.entries.write().insert(hash, work);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for ChainworkCache {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderChain {
    /// Target every header of chunk `index` is credited with.
    pub(crate) fn chunk_target(&self, registry: &ChainRegistry, index: BlockHeight) -> ChainResult<U256> {
        if let Some(checkpoint) = registry.params().checkpoint(index) {
            return Ok(checkpoint.target);
        }
        let first = index * CHUNK_SIZE;
        let header = self.read_header(registry, first)?.ok_or(ChainError::MissingHeader(first))?;
        Ok(bits_to_target(header.bits).map_err(DifficultyError::from)?)
    }

    /// Work of the chain up to `height` (the tip when `None`).
    ///
    /// On networks without PoW checks this is just the height.
    pub fn get_chainwork(&self, registry: &ChainRegistry, height: Option<BlockHeight>) -> ChainResult<U256> {
        let _guard = self.lock();
        let height = match height {
            Some(height) => height,
            None if self.height() < 0 => return Ok(U256::zero()),
            None => self.height(),
        };
        if registry.params().skip_pow_checks {
            return Ok(U256::from(height.max(0) as u64));
        }

        let cache = registry.chainwork_cache();
        let last_retarget = height / CHUNK_SIZE * CHUNK_SIZE - 1;
        let mut cached_height = last_retarget;
        let mut running_total = loop {
            if let Some(work) = cache.get(&self.get_hash(registry, cached_height)?) {
                break work;
            }
            if cached_height <= -1 {
                break U256::zero();
            }
            cached_height -= CHUNK_SIZE;
        };

        let chunk = U256::from(CHUNK_SIZE as u64);
        while cached_height < last_retarget {
            cached_height += CHUNK_SIZE;
            let work_in_single_header = work_from_target(self.chunk_target(registry, cached_height / CHUNK_SIZE)?);
            running_total = running_total.saturating_add(work_in_single_header.saturating_mul(chunk));
            cache.insert(self.get_hash(registry, cached_height)?, running_total);
        }

        let work_in_single_header = work_from_target(self.chunk_target(registry, height / CHUNK_SIZE)?);
        let partial = U256::from((height % CHUNK_SIZE + 1) as u64);
        Ok(running_total.saturating_add(work_in_single_header.saturating_mul(partial)))
    }
}
