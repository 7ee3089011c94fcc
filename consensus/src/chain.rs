//! A single candidate header chain.
//!
//! A chain owns the headers from its forkpoint up to its tip in one flat file.
//! Heights below the forkpoint belong to the parent chain and are looked up
//! there, walking up as many parents as needed.

use crate::errors::{ChainError, ChainResult};
use crate::registry::ChainRegistry;
use consensus_core::constants::{CHUNK_SIZE, HEADER_SIZE, STALE_TIP_DELAY_SECS};
use consensus_core::{BlockHeight, Checkpoint, Hash, Header, HeaderError, ZERO_HASH};
use consensus_pow::{should_check_bits_target, verify_header, HeaderSource, PendingHeaders};
use database::HeaderFile;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use primitive_types::U256;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

pub(crate) const RECORD_LEN: BlockHeight = HEADER_SIZE as BlockHeight;

/// Stable registry key of a chain. Survives reorg swaps, unlike the chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainHandle(u64);

impl ChainHandle {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChainHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ChainState {
    /// Height of the first header in this chain's file
    pub(crate) forkpoint: BlockHeight,
    /// `None` only for the main chain
    pub(crate) parent: Option<ChainHandle>,
    /// Hash of the header at `forkpoint`; the chain id
    pub(crate) forkpoint_hash: Hash,
    /// Hash of the header right below `forkpoint`
    pub(crate) prev_hash: Hash,
    /// Records in `file`, refreshed after every write
    pub(crate) size: BlockHeight,
    pub(crate) file: HeaderFile,
}

impl ChainState {
    pub(crate) fn new(forkpoint: BlockHeight, parent: Option<ChainHandle>, forkpoint_hash: Hash, prev_hash: Hash, file: HeaderFile) -> Self {
        Self { forkpoint, parent, forkpoint_hash, prev_hash, size: 0, file }
    }
}

enum Lookup {
    Found(Option<Header>),
    InParent(ChainHandle),
}

pub struct HeaderChain {
    handle: ChainHandle,
    /// Serializes mutations and size-dependent reads of this chain
    lock: ReentrantMutex<()>,
    state: RwLock<ChainState>,
}

impl fmt::Debug for HeaderChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("HeaderChain")
            .field("handle", &self.handle)
            .field("forkpoint", &state.forkpoint)
            .field("parent", &state.parent)
            .field("id", &state.forkpoint_hash)
            .field("size", &state.size)
            .finish()
    }
}

impl HeaderChain {
    pub(crate) fn new(handle: ChainHandle, state: ChainState) -> ChainResult<Self> {
        let chain = Self { handle, lock: ReentrantMutex::new(()), state: RwLock::new(state) };
        chain.update_size()?;
        Ok(chain)
    }

    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.lock.lock()
    }

    pub(crate) fn state(&self) -> RwLockReadGuard<'_, ChainState> {
        self.state.read()
    }

    pub(crate) fn state_mut(&self) -> RwLockWriteGuard<'_, ChainState> {
        self.state.write()
    }

    pub fn handle(&self) -> ChainHandle {
        self.handle
    }

    pub fn forkpoint(&self) -> BlockHeight {
        self.state().forkpoint
    }

    pub fn parent(&self) -> Option<ChainHandle> {
        self.state().parent
    }

    /// Chain identity: the hash at the forkpoint.
    pub fn id(&self) -> Hash {
        self.state().forkpoint_hash
    }

    pub fn prev_hash(&self) -> Hash {
        self.state().prev_hash
    }

    pub fn is_main(&self) -> bool {
        self.state().parent.is_none()
    }

    pub fn size(&self) -> BlockHeight {
        self.state().size
    }

    /// Tip height; -1 for an empty main chain.
    pub fn height(&self) -> BlockHeight {
        let state = self.state();
        state.forkpoint + state.size - 1
    }

    pub fn path(&self) -> PathBuf {
        self.state().file.path().to_path_buf()
    }

    pub(crate) fn file(&self) -> HeaderFile {
        self.state().file.clone()
    }

    pub(crate) fn update_size(&self) -> ChainResult<()> {
        let _guard = self.lock();
        let records = self.file().record_count()?;
        self.state_mut().size = records as BlockHeight;
        Ok(())
    }

    pub fn reader<'a>(&'a self, registry: &'a ChainRegistry) -> ChainReader<'a> {
        ChainReader { registry, chain: self }
    }

    fn lookup_own(&self, registry: &ChainRegistry, height: BlockHeight) -> ChainResult<Lookup> {
        let _guard = self.lock();
        let (forkpoint, parent, size, file) = {
            let state = self.state();
            (state.forkpoint, state.parent, state.size, state.file.clone())
        };
        if height < forkpoint {
            return match parent {
                Some(parent) => Ok(Lookup::InParent(parent)),
                None => Ok(Lookup::Found(None)),
            };
        }
        if height > forkpoint + size - 1 {
            return Ok(Lookup::Found(None));
        }
        registry.dir().ensure_available(file.path())?;
        let index = (height - forkpoint) as u64;
        match file.read_record(index)? {
            Some(raw) => Ok(Lookup::Found(Some(Header::deserialize(&raw, height)?))),
            // a sparse hole inside the file
            None if index < file.record_count()? => Ok(Lookup::Found(None)),
            // the file got shorter than the size we track
            None => Err(ChainError::MissingHeader(height)),
        }
    }

    /// Header at `height`, looked up in the parent chains below the forkpoint.
    ///
    /// `None` above the tip and for sparse placeholder records.
    pub fn read_header(&self, registry: &ChainRegistry, height: BlockHeight) -> ChainResult<Option<Header>> {
        if height < 0 {
            return Ok(None);
        }
        let mut ancestor: Option<Arc<HeaderChain>> = None;
        loop {
            let lookup = {
                let chain: &HeaderChain = ancestor.as_deref().unwrap_or(self);
                chain.lookup_own(registry, height)?
            };
            match lookup {
                Lookup::Found(header) => return Ok(header),
                Lookup::InParent(handle) => ancestor = Some(registry.get(handle).ok_or(ChainError::UnknownChain(handle))?),
            }
        }
    }

    pub fn get_hash(&self, registry: &ChainRegistry, height: BlockHeight) -> ChainResult<Hash> {
        let params = registry.params();
        if height == -1 {
            return Ok(ZERO_HASH);
        }
        if height == 0 {
            return Ok(params.genesis_hash);
        }
        if height > 0 && height <= params.max_checkpoint() && (height + 1) % CHUNK_SIZE == 0 {
            if let Some(checkpoint) = params.checkpoint(height / CHUNK_SIZE) {
                return Ok(checkpoint.hash);
            }
        }
        match self.read_header(registry, height)? {
            Some(header) => Ok(header.hash()),
            None => Err(ChainError::MissingHeader(height)),
        }
    }

    pub fn check_hash(&self, registry: &ChainRegistry, height: BlockHeight, hash: &Hash) -> bool {
        matches!(self.get_hash(registry, height), Ok(h) if h == *hash)
    }

    pub fn check_header(&self, registry: &ChainRegistry, header: &Header) -> bool {
        self.check_hash(registry, header.height, &header.hash())
    }

    pub fn header_at_tip(&self, registry: &ChainRegistry) -> ChainResult<Option<Header>> {
        let _guard = self.lock();
        self.read_header(registry, self.height())
    }

    pub fn is_tip_stale(&self, registry: &ChainRegistry) -> ChainResult<bool> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        self.is_tip_stale_at(registry, now)
    }

    /// Only the tip timestamp is looked at; consensus allows roughly two
    /// hours of clock leeway either way.
    pub fn is_tip_stale_at(&self, registry: &ChainRegistry, now_secs: u64) -> ChainResult<bool> {
        Ok(match self.header_at_tip(registry)? {
            Some(tip) => tip.timestamp as u64 + STALE_TIP_DELAY_SECS < now_secs,
            None => true,
        })
    }

    fn expected_target<S>(&self, registry: &ChainRegistry, height: BlockHeight, source: &mut S) -> ChainResult<Option<(u32, U256)>>
    where
        S: HeaderSource<Error = ChainError>,
    {
        if !should_check_bits_target(registry.params(), height) {
            return Ok(None);
        }
        registry.schedule().required_target(height, source).map(Some)
    }

    /// Whether `header` links to this chain, and when `check_height` is set,
    /// extends its tip directly. Any failure answers `false`.
    pub fn can_connect(&self, registry: &ChainRegistry, header: &Header, check_height: bool) -> bool {
        let _guard = self.lock();
        let height = header.height;
        if height < 0 || (check_height && self.height() != height - 1) {
            return false;
        }
        if height == 0 {
            return header.hash() == registry.params().genesis_hash;
        }
        let prev_hash = match self.get_hash(registry, height - 1) {
            Ok(hash) => hash,
            Err(_) => return false,
        };
        if prev_hash != header.prev_hash {
            return false;
        }
        let expected = match self.expected_target(registry, height, &mut self.reader(registry)) {
            Ok(expected) => expected,
            Err(_) => return false,
        };
        verify_header(header, &prev_hash, expected, None, registry.params(), registry.hasher()).is_ok()
    }

    /// Checks linkage, difficulty and proof of work of every header in a chunk.
    ///
    /// Headers of the chunk itself feed the retarget calculation of the ones
    /// after them, so the chunk can extend the chain before any of it is saved.
    pub fn verify_chunk(&self, registry: &ChainRegistry, index: BlockHeight, data: &[u8]) -> ChainResult<()> {
        if index < 0 {
            return Err(ChainError::InvalidChunkIndex(index));
        }
        if data.is_empty() {
            return Err(HeaderError::Empty.into());
        }
        if data.len() % HEADER_SIZE != 0 || data.len() > HEADER_SIZE * CHUNK_SIZE as usize {
            return Err(HeaderError::InvalidLength(data.len()).into());
        }

        let _guard = self.lock();
        let start = index * CHUNK_SIZE;
        let mut prev_hash = self.get_hash(registry, start - 1)?;
        let mut pending = PendingHeaders::new(self.reader(registry));

        for (i, raw) in data.chunks_exact(HEADER_SIZE).enumerate() {
            let height = start + i as BlockHeight;
            let expected_hash = match self.get_hash(registry, height) {
                Ok(hash) => Some(hash),
                Err(ChainError::MissingHeader(_)) => None,
                Err(e) => return Err(e),
            };
            let header = Header::deserialize(raw, height)?;
            pending.insert(header.clone());

            let expected = self.expected_target(registry, height, &mut pending)?;
            verify_header(&header, &prev_hash, expected, expected_hash.as_ref(), registry.params(), registry.hasher())
                .map_err(|source| ChainError::Verification { height, source })?;
            prev_hash = header.hash();
        }
        Ok(())
    }

    /// Writes `data` at byte `offset` of this chain's file.
    pub(crate) fn write(&self, registry: &ChainRegistry, data: &[u8], offset: BlockHeight, truncate: bool) -> ChainResult<()> {
        let _guard = self.lock();
        let file = self.file();
        registry.dir().ensure_available(file.path())?;
        file.write_at(data, offset as u64, truncate)?;
        self.update_size()
    }

    /// Appends the header that directly follows the tip, then lets the chain
    /// overtake its parent if it now has more work.
    pub fn save_header(&self, registry: &ChainRegistry, header: &Header) -> ChainResult<()> {
        let _guard = self.lock();
        let (forkpoint, size) = {
            let state = self.state();
            (state.forkpoint, state.size)
        };
        let delta = header.height - forkpoint;
        if delta != size {
            return Err(ChainError::NotNextHeader { expected: forkpoint + size, actual: header.height });
        }
        self.write(registry, &header.serialize(), delta * RECORD_LEN, true)?;
        debug!("saved header {} at height {} on {}", header.hash(), header.height, self.handle);
        registry.swap_with_parent(self)
    }

    /// Stores a whole chunk. Chunks inside the checkpointed region always go
    /// to the main chain; the part of a chunk below this chain's forkpoint is
    /// dropped, and a chunk lying entirely below it leaves the chain untouched.
    pub fn save_chunk(&self, registry: &ChainRegistry, index: BlockHeight, chunk: &[u8]) -> ChainResult<()> {
        if index < 0 {
            return Err(ChainError::InvalidChunkIndex(index));
        }
        let _guard = self.lock();
        let within_checkpoints = index < registry.params().checkpoints.len() as BlockHeight;
        if within_checkpoints && !self.is_main() {
            return registry.best_chain()?.save_chunk(registry, index, chunk);
        }

        let mut offset = (index * CHUNK_SIZE - self.forkpoint()) * RECORD_LEN;
        let mut data = chunk;
        if offset < 0 {
            let skip = (-offset as usize).min(chunk.len());
            data = &chunk[skip..];
            offset = 0;
        }
        if data.is_empty() {
            // entirely below the forkpoint
            debug!("chunk {} ends below forkpoint of {}, nothing to save", index, self.handle);
            return Ok(());
        }
        self.write(registry, data, offset, !within_checkpoints)?;
        debug!("saved chunk {} ({} bytes) on {}", index, data.len(), self.handle);
        registry.swap_with_parent(self)
    }

    /// Verifies and stores a hex-encoded chunk.
    ///
    /// Bad data answers `Ok(false)` and is logged. Only failures that leave
    /// the store unusable are returned as errors.
    pub fn connect_chunk(&self, registry: &ChainRegistry, index: BlockHeight, hex_data: &str) -> ChainResult<bool> {
        match self.try_connect_chunk(registry, index, hex_data) {
            Ok(()) => Ok(true),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                info!("verify_chunk idx {} failed: {}", index, e);
                Ok(false)
            }
        }
    }

    fn try_connect_chunk(&self, registry: &ChainRegistry, index: BlockHeight, hex_data: &str) -> ChainResult<()> {
        let data = hex::decode(hex_data.trim()).map_err(|e| HeaderError::InvalidHex(e.to_string()))?;
        self.verify_chunk(registry, index, &data)?;
        self.save_chunk(registry, index, &data)
    }

    /// Hash of the last header and the target of every full chunk, in the
    /// format accepted as checkpoint configuration.
    pub fn get_checkpoints(&self, registry: &ChainRegistry) -> ChainResult<Vec<Checkpoint>> {
        let _guard = self.lock();
        let chunks = self.height() / CHUNK_SIZE;
        let mut checkpoints = Vec::with_capacity(chunks.max(0) as usize);
        for index in 0..chunks {
            let hash = self.get_hash(registry, (index + 1) * CHUNK_SIZE - 1)?;
            let target = self.chunk_target(registry, index)?;
            checkpoints.push(Checkpoint::new(hash, target));
        }
        Ok(checkpoints)
    }
}

/// Retarget history served from a chain and its ancestors.
pub struct ChainReader<'a> {
    registry: &'a ChainRegistry,
    chain: &'a HeaderChain,
}

impl HeaderSource for ChainReader<'_> {
    type Error = ChainError;

    fn header_at(&mut self, height: BlockHeight) -> Result<Option<Header>, Self::Error> {
        self.chain.read_header(self.registry, height)
    }
}
