use crate::config::checkpoints::Checkpoint;
use crate::config::genesis::{MAINNET_GENESIS_HASH, TESTNET_GENESIS_HASH};
use crate::constants::CHUNK_SIZE;
use crate::network::NetworkType;
use crate::{BlockHeight, Hash};
use crypto_hashes::PowAlgorithm;
use serde::{Deserialize, Serialize};

/// Height from which a proof-of-work function applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowActivation {
    pub height: BlockHeight,
    pub algorithm: PowAlgorithm,
}

/// Consensus parameters of the header chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Network the parameters belong to; also selects the retarget rule table
    pub net: NetworkType,
    /// Hash of the header at height 0
    pub genesis_hash: Hash,
    /// One entry per leading chunk, in height order
    pub checkpoints: Vec<Checkpoint>,
    /// Accept any bits and PoW; chainwork degenerates to height
    pub skip_pow_checks: bool,
    /// PoW functions by activation height, ascending
    pub pow_schedule: Vec<PowActivation>,
}

const fn activation(height: BlockHeight, algorithm: PowAlgorithm) -> PowActivation {
    PowActivation { height, algorithm }
}

fn ledger_pow_schedule() -> Vec<PowActivation> {
    vec![
        activation(0, PowAlgorithm::ScryptN),
        activation(208_301, PowAlgorithm::Lyra2RE),
        activation(347_000, PowAlgorithm::Lyra2REv2),
        activation(1_080_001, PowAlgorithm::Lyra2REv3),
        activation(1_500_000, PowAlgorithm::Verthash),
    ]
}

impl Params {
    pub fn mainnet() -> Self {
        Self {
            net: NetworkType::Mainnet,
            genesis_hash: MAINNET_GENESIS_HASH,
            checkpoints: Vec::new(),
            skip_pow_checks: false,
            pow_schedule: ledger_pow_schedule(),
        }
    }

    pub fn testnet() -> Self {
        Self {
            net: NetworkType::Testnet,
            genesis_hash: TESTNET_GENESIS_HASH,
            checkpoints: Vec::new(),
            skip_pow_checks: true,
            pow_schedule: ledger_pow_schedule(),
        }
    }

    /// Minimum-difficulty double-SHA256 network. Genesis is whatever the
    /// caller mined.
    pub fn simnet(genesis_hash: Hash) -> Self {
        Self {
            net: NetworkType::Simnet,
            genesis_hash,
            checkpoints: Vec::new(),
            skip_pow_checks: false,
            pow_schedule: vec![activation(0, PowAlgorithm::Sha256d)],
        }
    }

    pub fn for_network(net: NetworkType) -> Self {
        match net {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Testnet => Self::testnet(),
            NetworkType::Simnet => Self::simnet(Hash::zeroed()),
        }
    }

    pub fn with_checkpoints(mut self, checkpoints: Vec<Checkpoint>) -> Self {
        self.checkpoints = checkpoints;
        self
    }

    pub fn with_genesis(mut self, genesis_hash: Hash) -> Self {
        self.genesis_hash = genesis_hash;
        self
    }

    /// Height of the last checkpointed header, or 0 without checkpoints.
    pub fn max_checkpoint(&self) -> BlockHeight {
        (self.checkpoints.len() as BlockHeight * CHUNK_SIZE - 1).max(0)
    }

    pub fn checkpoint(&self, index: BlockHeight) -> Option<&Checkpoint> {
        usize::try_from(index).ok().and_then(|i| self.checkpoints.get(i))
    }

    pub fn pow_algorithm(&self, height: BlockHeight) -> PowAlgorithm {
        self.pow_schedule
            .iter()
            .rev()
            .find(|a| a.height <= height)
            .or_else(|| self.pow_schedule.first())
            .map(|a| a.algorithm)
            .unwrap_or(PowAlgorithm::Sha256d)
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    #[test]
    fn pow_algorithm_by_height() {
        let params = Params::mainnet();
        assert_eq!(params.pow_algorithm(0), PowAlgorithm::ScryptN);
        assert_eq!(params.pow_algorithm(208_300), PowAlgorithm::ScryptN);
        assert_eq!(params.pow_algorithm(208_301), PowAlgorithm::Lyra2RE);
        assert_eq!(params.pow_algorithm(346_999), PowAlgorithm::Lyra2RE);
        assert_eq!(params.pow_algorithm(347_000), PowAlgorithm::Lyra2REv2);
        assert_eq!(params.pow_algorithm(1_080_000), PowAlgorithm::Lyra2REv2);
        assert_eq!(params.pow_algorithm(1_080_001), PowAlgorithm::Lyra2REv3);
        assert_eq!(params.pow_algorithm(1_499_999), PowAlgorithm::Lyra2REv3);
        assert_eq!(params.pow_algorithm(1_500_000), PowAlgorithm::Verthash);
        assert_eq!(Params::simnet(Hash::zeroed()).pow_algorithm(5_000_000), PowAlgorithm::Sha256d);
    }

    #[test]
    fn max_checkpoint_height() {
        let params = Params::mainnet();
        assert_eq!(params.max_checkpoint(), 0);
        let cp = Checkpoint::new(Hash::zeroed(), U256::one());
        let params = params.with_checkpoints(vec![cp; 3]);
        assert_eq!(params.max_checkpoint(), 3 * 2016 - 1);
        assert!(params.checkpoint(2).is_some());
        assert!(params.checkpoint(3).is_none());
        assert!(params.checkpoint(-1).is_none());
    }

    #[test]
    fn testnet_skips_pow() {
        assert!(Params::testnet().skip_pow_checks);
        assert!(!Params::mainnet().skip_pow_checks);
        assert_eq!(Params::for_network(NetworkType::Testnet).net, NetworkType::Testnet);
    }
}
