//! Where a chain sits among the others.

use crate::chain::{ChainHandle, HeaderChain};
use crate::errors::ChainResult;
use crate::registry::ChainRegistry;
use consensus_core::BlockHeight;
use std::collections::BTreeMap;
use std::sync::Arc;

impl HeaderChain {
    pub fn get_direct_children(&self, registry: &ChainRegistry) -> Vec<Arc<HeaderChain>> {
        registry.children_of(self.handle())
    }

    /// Highest forkpoint among the direct children.
    pub fn get_max_child(&self, registry: &ChainRegistry) -> Option<BlockHeight> {
        self.get_direct_children(registry).iter().map(|c| c.forkpoint()).max()
    }

    /// The highest height at which some chain branches off this one.
    pub fn get_max_forkpoint(&self, registry: &ChainRegistry) -> BlockHeight {
        self.get_max_child(registry).unwrap_or_else(|| self.forkpoint())
    }

    /// Each chain on the path to the main chain, with the height of the last
    /// block this chain shares with it.
    pub fn get_parent_heights(&self, registry: &ChainRegistry) -> BTreeMap<ChainHandle, BlockHeight> {
        let _guard = self.lock();
        let mut result = BTreeMap::new();
        result.insert(self.handle(), self.height());
        let (mut forkpoint, mut parent) = (self.forkpoint(), self.parent());
        while let Some(chain) = parent.and_then(|h| registry.get(h)) {
            if result.insert(chain.handle(), forkpoint - 1).is_some() {
                break;
            }
            forkpoint = chain.forkpoint();
            parent = chain.parent();
        }
        result
    }

    pub fn get_height_of_last_common_block_with_chain(&self, registry: &ChainRegistry, other: &HeaderChain) -> BlockHeight {
        let ours = self.get_parent_heights(registry);
        let theirs = other.get_parent_heights(registry);
        ours.iter()
            .filter_map(|(handle, height)| theirs.get(handle).map(|other_height| *height.min(other_height)))
            .fold(0, BlockHeight::max)
    }

    /// Headers above the highest fork off this chain.
    pub fn get_branch_size(&self, registry: &ChainRegistry) -> BlockHeight {
        let _guard = self.lock();
        self.height() - self.get_max_forkpoint(registry) + 1
    }

    /// Short display name: leading hex digits of the hash at the max forkpoint.
    pub fn get_name(&self, registry: &ChainRegistry) -> ChainResult<String> {
        let hash = self.get_hash(registry, self.get_max_forkpoint(registry))?;
        Ok(hash.to_stripped_hex().chars().take(10).collect())
    }
}
