//! Header access for retarget calculations.

use crate::errors::DifficultyError;
use consensus_core::{BlockHeight, Header};
use std::collections::BTreeMap;

/// Anything that can hand out headers by height.
///
/// `Ok(None)` means the height is not known to the source. Sources that can
/// fail for other reasons (I/O) report that through `Error`.
pub trait HeaderSource {
    type Error: From<DifficultyError>;

    fn header_at(&mut self, height: BlockHeight) -> Result<Option<Header>, Self::Error>;

    /// Like `header_at`, but an absent header is an error.
    fn require(&mut self, height: BlockHeight) -> Result<Header, Self::Error> {
        self.header_at(height)?
            .ok_or_else(|| DifficultyError::MissingHeader(height).into())
    }
}

impl HeaderSource for BTreeMap<BlockHeight, Header> {
    type Error = DifficultyError;

    fn header_at(&mut self, height: BlockHeight) -> Result<Option<Header>, Self::Error> {
        Ok(self.get(&height).cloned())
    }
}

/// Headers not yet persisted, layered over a backing source.
///
/// Pending headers win over the backing source. Headers fetched from the
/// backing source are remembered for the lifetime of the overlay, so one
/// overlay should live no longer than one verification pass.
pub struct PendingHeaders<S> {
    pending: BTreeMap<BlockHeight, Header>,
    inner: S,
}

impl<S: HeaderSource> PendingHeaders<S> {
    pub fn new(inner: S) -> Self {
        Self { pending: BTreeMap::new(), inner }
    }

    pub fn insert(&mut self, header: Header) {
        self.pending.insert(header.height, header);
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<S: HeaderSource> HeaderSource for PendingHeaders<S> {
    type Error = S::Error;

    fn header_at(&mut self, height: BlockHeight) -> Result<Option<Header>, Self::Error> {
        if let Some(header) = self.pending.get(&height) {
            return Ok(Some(header.clone()));
        }
        let fetched = self.inner.header_at(height)?;
        if let Some(header) = &fetched {
            self.pending.insert(height, header.clone());
        }
        Ok(fetched)
    }
}
