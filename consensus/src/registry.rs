//! Table of all known chains and the queries that span them.

use crate::chain::{ChainHandle, ChainState, HeaderChain};
use crate::chainwork::ChainworkCache;
use crate::errors::{ChainError, ChainResult};
use consensus_core::constants::{CHUNK_SIZE, HEADER_SIZE};
use consensus_core::{BlockHeight, Hash, Header, Params, ZERO_HASH};
use consensus_pow::DifficultySchedule;
use crypto_hashes::{DefaultPowHasher, PowHasher};
use database::{ForkFileName, HeaderFile, HeadersDir};
use parking_lot::RwLock;
use primitive_types::U256;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
struct RegistryInner {
    chains: BTreeMap<ChainHandle, Arc<HeaderChain>>,
    by_id: HashMap<Hash, ChainHandle>,
}

/// A fork file dropped by the startup consistency pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardedChain {
    pub file_name: String,
    pub reason: String,
}

/// What the startup consistency pass found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// The main chain did not connect past the last checkpoint and was wiped
    pub main_chain_reset: bool,
    pub discarded: Vec<DiscardedChain>,
}

/// All header chains of one headers directory.
///
/// Lock order: a chain's own lock (if needed) first, then the registry table.
/// The table lock is only ever held for short map operations.
pub struct ChainRegistry {
    params: Params,
    schedule: DifficultySchedule,
    dir: HeadersDir,
    hasher: Arc<dyn PowHasher>,
    chainwork: ChainworkCache,
    inner: RwLock<RegistryInner>,
    next_handle: AtomicU64,
    report: LoadReport,
}

impl ChainRegistry {
    pub fn open(params: Params, dir: HeadersDir) -> ChainResult<Self> {
        Self::open_with_hasher(params, dir, Arc::new(DefaultPowHasher))
    }

    /// Loads the main chain and every fork file, dropping the ones that fail
    /// consistency checks, then sizes the main chain file to cover the
    /// checkpointed region.
    pub fn open_with_hasher(params: Params, dir: HeadersDir, hasher: Arc<dyn PowHasher>) -> ChainResult<Self> {
        let schedule = DifficultySchedule::for_params(&params);
        let mut registry = Self {
            params,
            schedule,
            dir,
            hasher,
            chainwork: ChainworkCache::new(),
            inner: RwLock::new(RegistryInner::default()),
            next_handle: AtomicU64::new(0),
            report: LoadReport::default(),
        };
        registry.report = registry.read_chains()?;
        registry.init_main_chain_file()?;
        Ok(registry)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn schedule(&self) -> &DifficultySchedule {
        &self.schedule
    }

    pub fn dir(&self) -> &HeadersDir {
        &self.dir
    }

    pub fn hasher(&self) -> &dyn PowHasher {
        self.hasher.as_ref()
    }

    pub fn chainwork_cache(&self) -> &ChainworkCache {
        &self.chainwork
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    fn next_handle(&self) -> ChainHandle {
        ChainHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn insert(&self, chain: Arc<HeaderChain>) {
        let id = chain.id();
        let mut inner = self.inner.write();
        inner.by_id.insert(id, chain.handle());
        inner.chains.insert(chain.handle(), chain);
    }

    pub(crate) fn remove(&self, handle: ChainHandle) -> Option<Arc<HeaderChain>> {
        let mut inner = self.inner.write();
        let chain = inner.chains.remove(&handle)?;
        inner.by_id.retain(|_, h| *h != handle);
        Some(chain)
    }

    /// Points `ids` at their chains again after a swap changed them.
    pub(crate) fn rekey(&self, old_ids: &[Hash], chains: &[&HeaderChain]) {
        let mut inner = self.inner.write();
        for id in old_ids {
            inner.by_id.remove(id);
        }
        for chain in chains {
            inner.by_id.insert(chain.id(), chain.handle());
        }
    }

    pub fn get(&self, handle: ChainHandle) -> Option<Arc<HeaderChain>> {
        self.inner.read().chains.get(&handle).cloned()
    }

    pub fn get_by_id(&self, id: &Hash) -> Option<Arc<HeaderChain>> {
        let inner = self.inner.read();
        inner.by_id.get(id).and_then(|handle| inner.chains.get(handle)).cloned()
    }

    /// Snapshot of all chains, in registration order.
    pub fn chains(&self) -> Vec<Arc<HeaderChain>> {
        self.inner.read().chains.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().chains.is_empty()
    }

    /// The chain holding the genesis header in its own file.
    pub fn best_chain(&self) -> ChainResult<Arc<HeaderChain>> {
        self.get_by_id(&self.params.genesis_hash).ok_or(ChainError::UnknownChainId(self.params.genesis_hash))
    }

    pub(crate) fn children_of(&self, handle: ChainHandle) -> Vec<Arc<HeaderChain>> {
        self.chains().into_iter().filter(|c| c.parent() == Some(handle)).collect()
    }

    /// Any chain that has `header` at its height.
    pub fn check_header(&self, header: &Header) -> Option<Arc<HeaderChain>> {
        self.chains().into_iter().find(|chain| chain.check_header(self, header))
    }

    /// The chain whose tip `header` directly extends.
    pub fn can_connect(&self, header: &Header) -> Option<Arc<HeaderChain>> {
        self.chains().into_iter().find(|chain| chain.can_connect(self, header, true))
    }

    /// Chains with `hash` at `height`, most work first.
    pub fn get_chains_that_contain_header(&self, height: BlockHeight, hash: &Hash) -> ChainResult<Vec<Arc<HeaderChain>>> {
        let mut found = Vec::new();
        for chain in self.chains() {
            if chain.check_hash(self, height, hash) {
                found.push((chain.get_chainwork(self, None)?, chain));
            }
        }
        found.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(found.into_iter().map(|(_, chain)| chain).collect())
    }

    /// Chainwork of every chain, keyed by handle.
    pub fn chainworks(&self) -> ChainResult<BTreeMap<ChainHandle, U256>> {
        self.chains().into_iter().map(|c| Ok((c.handle(), c.get_chainwork(self, None)?))).collect()
    }

    /// Starts a new chain at `header`, which links below the tip of `parent`.
    pub fn fork(&self, parent: &HeaderChain, header: &Header) -> ChainResult<Arc<HeaderChain>> {
        if !parent.can_connect(self, header, false) {
            return Err(ChainError::DoesNotConnect(header.height));
        }
        let forkpoint = header.height;
        let max_checkpoint = self.params.max_checkpoint();
        if forkpoint <= max_checkpoint {
            return Err(ChainError::ForkBelowCheckpoint { forkpoint, max_checkpoint });
        }
        let prev_hash = parent.get_hash(self, forkpoint - 1)?;
        let name = ForkFileName::new(forkpoint, prev_hash, header.hash());

        self.dir.ensure_available(&parent.path())?;
        let file = HeaderFile::new(self.dir.fork_path(&name));
        file.create_empty()?;

        let state = ChainState::new(forkpoint, Some(parent.handle()), name.first_hash, prev_hash, file);
        let chain = Arc::new(HeaderChain::new(self.next_handle(), state)?);
        self.insert(chain.clone());
        info!("new fork {} at height {} off {}", chain.handle(), forkpoint, parent.handle());
        chain.save_header(self, header)?;
        Ok(chain)
    }

    fn read_chains(&self) -> ChainResult<LoadReport> {
        let mut report = LoadReport::default();
        let main_file = HeaderFile::new(self.dir.main_chain_path());
        let main_state = ChainState::new(0, None, self.params.genesis_hash, ZERO_HASH, main_file);
        let main = Arc::new(HeaderChain::new(self.next_handle(), main_state)?);
        self.insert(main.clone());

        let max_checkpoint = self.params.max_checkpoint();
        if main.height() > max_checkpoint {
            let connects = match main.read_header(self, max_checkpoint + 1) {
                Ok(Some(header)) => main.can_connect(self, &header, false),
                _ => false,
            };
            if !connects {
                info!("deleting best chain. cannot connect header after last checkpoint to last checkpoint.");
                main.file().remove()?;
                main.update_size()?;
                report.main_chain_reset = true;
            }
        }

        // sorted by forkpoint, so a fork's parent is always loaded before it
        for name in self.dir.list_forks()? {
            if let Err(reason) = self.instantiate_fork(&name)? {
                info!("deleting chain {}: {}", name, reason);
                HeaderFile::new(self.dir.fork_path(&name)).remove()?;
                report.discarded.push(DiscardedChain { file_name: name.to_string(), reason: reason.to_string() });
            }
        }
        Ok(report)
    }

    /// Outer error: storage failure. Inner error: the fork is inconsistent.
    fn instantiate_fork(&self, name: &ForkFileName) -> ChainResult<Result<(), &'static str>> {
        if name.forkpoint <= self.params.max_checkpoint() {
            return Ok(Err("fork below max checkpoint"));
        }
        let parent = match self.chains().into_iter().find(|c| c.check_hash(self, name.forkpoint - 1, &name.prev_hash)) {
            Some(parent) => parent,
            None => return Ok(Err("cannot find parent for chain")),
        };
        let file = HeaderFile::new(self.dir.fork_path(name));
        let state = ChainState::new(name.forkpoint, Some(parent.handle()), name.first_hash, name.prev_hash, file);
        let chain = Arc::new(HeaderChain::new(self.next_handle(), state)?);

        let first = match chain.read_header(self, name.forkpoint) {
            Ok(Some(header)) if header.hash() == name.first_hash => header,
            _ => return Ok(Err("incorrect first hash for chain")),
        };
        if !parent.can_connect(self, &first, false) {
            return Ok(Err("cannot connect chain to parent"));
        }
        debug!("loaded fork {} at height {} (size {})", chain.handle(), name.forkpoint, chain.size());
        self.insert(chain);
        Ok(Ok(()))
    }

    /// Grows the main chain file to the checkpointed length as a sparse file.
    fn init_main_chain_file(&self) -> ChainResult<()> {
        let best = self.best_chain()?;
        let _guard = best.lock();
        let len = (HEADER_SIZE as BlockHeight * self.params.checkpoints.len() as BlockHeight * CHUNK_SIZE) as u64;
        best.file().ensure_len_sparse(len)?;
        best.update_size()
    }
}
