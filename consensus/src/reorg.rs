//! Swapping a chain with its parent once it has more work.
//!
//! Both chains keep the headers they logically contain, but the bytes and
//! identities move: the stronger chain takes over the parent's file, id and
//! forkpoint, and the weaker one becomes a fork holding the parent's old
//! branch.

use crate::chain::{HeaderChain, RECORD_LEN};
use crate::errors::{ChainError, ChainResult};
use crate::registry::ChainRegistry;
use consensus_core::constants::HEADER_SIZE;
use consensus_core::hashing::header::hash_raw;
use consensus_core::ZERO_HASH;
use database::ForkFileName;
use tracing::{debug, info};

impl ChainRegistry {
    /// Swaps `chain` upwards for as long as it outworks its parent.
    pub(crate) fn swap_with_parent(&self, chain: &HeaderChain) -> ChainResult<()> {
        let _guard = chain.lock();
        let mut swaps = 0usize;
        while self.try_swap_with_parent(chain)? {
            swaps += 1;
            let chains = self.len();
            if swaps > chains {
                return Err(ChainError::ReorgInvariantViolation(format!(
                    "swapping fork with parent too many times: {} swaps over {} chains",
                    swaps, chains
                )));
            }
        }
        Ok(())
    }

    /// One swap step. `false` once the chain no longer outworks its parent.
    ///
    /// A chain's `parent` only changes under its own lock or the lock of its
    /// current parent, so it is re-read once the parent is locked.
    fn try_swap_with_parent(&self, chain: &HeaderChain) -> ChainResult<bool> {
        loop {
            let parent_handle = match chain.parent() {
                Some(handle) => handle,
                None => return Ok(false),
            };
            let parent = match self.get(parent_handle) {
                Some(parent) => parent,
                None if chain.parent() != Some(parent_handle) => continue,
                None => return Err(ChainError::UnknownChain(parent_handle)),
            };
            let _parent_guard = parent.lock();
            if chain.parent() != Some(parent_handle) {
                debug!("{} was re-parented while waiting for {}", chain.handle(), parent_handle);
                continue;
            }
            return self.swap_locked(chain, &parent);
        }
    }

    /// Both `chain` and its `parent` are locked by the caller.
    fn swap_locked(&self, chain: &HeaderChain, parent: &HeaderChain) -> ChainResult<bool> {
        if parent.get_chainwork(self, None)? >= chain.get_chainwork(self, None)? {
            return Ok(false);
        }
        let parent_handle = parent.handle();

        let (forkpoint, child_old_id) = {
            let state = chain.state();
            (state.forkpoint, state.forkpoint_hash)
        };
        let (parent_forkpoint, parent_old_id) = {
            let state = parent.state();
            (state.forkpoint, state.forkpoint_hash)
        };
        info!("swapping {} {}", forkpoint, parent_forkpoint);
        if forkpoint <= parent_forkpoint {
            return Err(ChainError::ReorgInvariantViolation(format!(
                "forkpoint of parent chain ({}) should be at lower height than children's ({})",
                parent_forkpoint, forkpoint
            )));
        }

        let child_file = chain.file();
        self.dir().ensure_available(child_file.path())?;
        let my_data = child_file.read_all()?;
        let parent_file = parent.file();
        self.dir().ensure_available(parent_file.path())?;
        let offset = (forkpoint - parent_forkpoint) * RECORD_LEN;
        let parent_branch_size = (parent.height() - forkpoint + 1).max(0);
        let parent_data = parent_file.read_range(offset as u64, (parent_branch_size * RECORD_LEN) as u64)?;

        chain.write(self, &parent_data, 0, true)?;
        parent.write(self, &my_data, offset, true)?;

        let parent_lost_everything = parent_data.len() < HEADER_SIZE;
        {
            let mut child = chain.state_mut();
            let mut old_parent = parent.state_mut();
            let child_state = &mut *child;
            let parent_state = &mut *old_parent;

            child_state.parent = parent_state.parent.replace(chain.handle());
            std::mem::swap(&mut child_state.forkpoint, &mut parent_state.forkpoint);
            child_state.forkpoint_hash = std::mem::replace(
                &mut parent_state.forkpoint_hash,
                if parent_lost_everything { ZERO_HASH } else { hash_raw(&parent_data[..HEADER_SIZE]) },
            );
            std::mem::swap(&mut child_state.prev_hash, &mut parent_state.prev_hash);
            // the files stay put; each chain now owns the other's path
            std::mem::swap(&mut child_state.file, &mut parent_state.file);
        }

        if parent_lost_everything {
            // nothing left in the old parent; it would only shadow our id
            parent.file().remove()?;
            self.remove(parent.handle());
        } else {
            let name = {
                let state = parent.state();
                ForkFileName::new(state.forkpoint, state.prev_hash, state.forkpoint_hash)
            };
            let mut file = parent.file();
            file.rename_to(self.dir().fork_path(&name))?;
            parent.state_mut().file = file;
        }
        chain.update_size()?;
        parent.update_size()?;

        if parent_lost_everything {
            self.rekey(&[child_old_id, parent_old_id], &[chain]);
        } else {
            self.rekey(&[child_old_id, parent_old_id], &[chain, parent]);
        }

        // former siblings that branch off the part we now own move under us
        for sibling in self.children_of(parent_handle) {
            let (forkpoint, prev_hash) = {
                let state = sibling.state();
                (state.forkpoint, state.prev_hash)
            };
            if chain.check_hash(self, forkpoint - 1, &prev_hash) {
                sibling.state_mut().parent = Some(chain.handle());
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::constants::SIMNET_POW_BITS;
    use consensus_core::{Hash, Header, Params};
    use consensus_pow::bits_to_target;
    use database::HeadersDir;
    use primitive_types::U256;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn mine(mut header: Header) -> Header {
        let target = bits_to_target(SIMNET_POW_BITS).unwrap();
        while U256::from_little_endian(header.hash().as_bytes()) > target {
            header.nonce += 1;
        }
        header
    }

    fn next(prev: &Header, branch: u8) -> Header {
        mine(Header::new(1, prev.hash(), Hash::from_bytes([branch; 32]), prev.timestamp + 150, SIMNET_POW_BITS, 0, prev.height + 1))
    }

    fn extend(prev: &Header, count: usize, branch: u8) -> Vec<Header> {
        let mut headers = vec![next(prev, branch)];
        while headers.len() < count {
            let last = next(&headers[headers.len() - 1], branch);
            headers.push(last);
        }
        headers
    }

    /// A registry whose main chain holds heights `0..=5`.
    fn open_with_main(tmp: &TempDir) -> (ChainRegistry, Vec<Header>) {
        let genesis = mine(Header::new(1, ZERO_HASH, Hash::from_bytes([0xaa; 32]), 1_600_000_000, SIMNET_POW_BITS, 0, 0));
        let mut headers = vec![genesis.clone()];
        headers.extend(extend(&genesis, 5, 0));
        let dir = HeadersDir::open(tmp.path().join("headers")).unwrap();
        let registry = ChainRegistry::open(Params::simnet(genesis.hash()), dir).unwrap();
        let main = registry.best_chain().unwrap();
        for header in &headers {
            main.save_header(&registry, header).unwrap();
        }
        (registry, headers)
    }

    #[test]
    fn sibling_waiting_on_parent_follows_the_swap() {
        let tmp = TempDir::new().unwrap();
        let (registry, headers) = open_with_main(&tmp);
        let main = registry.best_chain().unwrap();

        // two forks off height 2, level with main at height 5
        let c = extend(&headers[2], 4, 0xcc);
        let s = extend(&headers[2], 4, 0x55);
        let c_chain = registry.fork(&main, &c[0]).unwrap();
        let s_chain = registry.fork(&main, &s[0]).unwrap();
        for header in &c[1..3] {
            c_chain.save_header(&registry, header).unwrap();
        }
        for header in &s[1..3] {
            s_chain.save_header(&registry, header).unwrap();
        }
        assert_eq!(c_chain.height(), 5);
        assert_eq!(s_chain.height(), 5);
        assert!(main.is_main());

        thread::scope(|scope| {
            let main_guard = main.lock();
            // blocks on main's lock once its header is written
            let waiting = scope.spawn(|| s_chain.save_header(&registry, &s[3]));
            while s_chain.size() < 4 {
                thread::sleep(Duration::from_millis(5));
            }
            thread::sleep(Duration::from_millis(100));

            c_chain.save_header(&registry, &c[3]).unwrap();
            assert!(c_chain.is_main());
            drop(main_guard);
            waiting.join().unwrap().unwrap();
        });

        // level with the new main, so the sibling stays a fork under it
        assert_eq!(registry.best_chain().unwrap().handle(), c_chain.handle());
        assert_eq!(s_chain.parent(), Some(c_chain.handle()));
        assert_eq!(main.parent(), Some(c_chain.handle()));
        assert_eq!(s_chain.read_header(&registry, 6).unwrap(), Some(s[3].clone()));
        assert_eq!(s_chain.get_hash(&registry, 2).unwrap(), headers[2].hash());
        assert_eq!(main.read_header(&registry, 5).unwrap(), Some(headers[5].clone()));
        assert_eq!(c_chain.read_header(&registry, 6).unwrap(), Some(c[3].clone()));
    }

    #[test]
    fn forkpoint_below_parent_aborts_before_touching_files() {
        let tmp = TempDir::new().unwrap();
        let (registry, headers) = open_with_main(&tmp);
        let main = registry.best_chain().unwrap();
        let fork = registry.fork(&main, &next(&headers[2], 0xbb)).unwrap();
        assert_eq!(fork.forkpoint(), 3);

        // a fork claiming to start at genesis that outworks an emptied parent
        fork.state_mut().forkpoint = 0;
        main.state_mut().size = 0;

        let err = registry.swap_with_parent(&fork).unwrap_err();
        assert!(matches!(err, ChainError::ReorgInvariantViolation(_)));
        assert!(err.is_fatal());
        assert_eq!(main.file().record_count().unwrap(), 6);
        assert_eq!(fork.file().record_count().unwrap(), 1);
        assert_eq!(fork.parent(), Some(main.handle()));
    }
}
