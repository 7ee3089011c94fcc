use consensus_core::config::checkpoints::load_checkpoints;
use consensus_core::{Hash, NetworkType, Params};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network_id: NetworkType,
    /// Display hex. Required on simnet, overrides the built-in hash elsewhere.
    #[serde(default)]
    pub genesis_hash: Option<String>,
    #[serde(default)]
    pub checkpoints_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub headers_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// Load configuration from file if it exists, otherwise use defaults
    pub fn load(path: &Path) -> Result<Self, String> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config file: {}", e))?;

            let config: Config = toml::from_str(&content)
                .map_err(|e| format!("Failed to parse config: {}", e))?;

            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Load default configuration for network
    pub fn for_network(network: &str) -> Result<Self, String> {
        let network_id: NetworkType = network.parse().map_err(|e| format!("{}", e))?;
        let mut config = Config::default();
        config.network.network_id = network_id;
        config.storage.headers_dir = PathBuf::from(format!("./{}/headers", network_id));
        Ok(config)
    }

    /// Override config with CLI arguments
    pub fn apply_cli_overrides(&mut self, args: &crate::cli::Args) -> Result<(), String> {
        if let Some(network) = &args.network {
            self.network.network_id = network.parse().map_err(|e| format!("{}", e))?;
        }

        if let Some(headers_dir) = &args.headers_dir {
            self.storage.headers_dir = headers_dir.clone();
        }

        if let Some(checkpoints) = &args.checkpoints {
            self.network.checkpoints_file = Some(checkpoints.clone());
        }

        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        Ok(())
    }

    /// Consensus parameters for the configured network.
    pub fn params(&self) -> Result<Params, String> {
        let genesis = match &self.network.genesis_hash {
            Some(hex) => Some(hex.parse::<Hash>().map_err(|e| format!("Invalid genesis hash: {}", e))?),
            None => None,
        };

        let mut params = match (self.network.network_id, genesis) {
            (NetworkType::Simnet, Some(genesis)) => Params::simnet(genesis),
            (NetworkType::Simnet, None) => return Err("simnet needs network.genesis_hash".to_string()),
            (net, Some(genesis)) => Params::for_network(net).with_genesis(genesis),
            (net, None) => Params::for_network(net),
        };

        if let Some(path) = &self.network.checkpoints_file {
            let checkpoints = load_checkpoints(path)
                .map_err(|e| format!("Failed to load checkpoints from {}: {}", path.display(), e))?;
            params = params.with_checkpoints(checkpoints);
        }

        Ok(params)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                network_id: NetworkType::Mainnet,
                genesis_hash: None,
                checkpoints_file: None,
            },
            storage: StorageConfig {
                headers_dir: PathBuf::from("./headers"),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}
