//! Subcommand implementations.
//!
//! Each command has a data-returning half used by tests and a printing half
//! used by the binary.

use crate::cli::Command;
use crate::config::Config;
use crate::ui::{self, StatusType};
use consensus::{ChainError, ChainHandle, ChainRegistry, ChainResult, LoadReport};
use consensus_core::config::checkpoints::save_checkpoints;
use consensus_core::{BlockHeight, Checkpoint, Header, U256};
use database::HeadersDir;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// One row of `headerd info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSummary {
    pub handle: ChainHandle,
    pub name: String,
    pub is_main: bool,
    pub forkpoint: BlockHeight,
    pub parent: Option<ChainHandle>,
    pub height: BlockHeight,
    pub branch_size: BlockHeight,
    pub chainwork: U256,
}

pub fn open_registry(config: &Config) -> Result<ChainRegistry, String> {
    let params = config.params()?;
    let dir = HeadersDir::open(&config.storage.headers_dir)
        .map_err(|e| format!("Failed to open headers directory: {}", e))?;
    let registry = ChainRegistry::open(params, dir).map_err(|e| format!("Failed to load chains: {}", e))?;
    info!("loaded {} chain(s) from {}", registry.len(), config.storage.headers_dir.display());
    Ok(registry)
}

/// All chains, most work first.
pub fn chain_summaries(registry: &ChainRegistry) -> ChainResult<Vec<ChainSummary>> {
    let mut summaries = Vec::with_capacity(registry.len());
    for chain in registry.chains() {
        summaries.push(ChainSummary {
            handle: chain.handle(),
            name: chain.get_name(registry)?,
            is_main: chain.is_main(),
            forkpoint: chain.forkpoint(),
            parent: chain.parent(),
            height: chain.height(),
            branch_size: chain.get_branch_size(registry),
            chainwork: chain.get_chainwork(registry, None)?,
        });
    }
    summaries.sort_by(|a, b| b.chainwork.cmp(&a.chainwork));
    Ok(summaries)
}

/// Reads a hex chunk from `path` and connects it to the best chain.
///
/// `Ok(false)` means the chunk was rejected without touching storage.
pub fn import_chunk(registry: &ChainRegistry, index: BlockHeight, path: &Path) -> Result<bool, String> {
    let hex_data = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let best = registry.best_chain().map_err(|e| e.to_string())?;
    let connected = best.connect_chunk(registry, index, &hex_data).map_err(|e| e.to_string())?;
    if !connected {
        warn!("chunk {} from {} was rejected", index, path.display());
    }
    Ok(connected)
}

pub fn header_at(registry: &ChainRegistry, height: BlockHeight) -> ChainResult<Option<Header>> {
    registry.best_chain()?.read_header(registry, height)
}

pub fn export_checkpoints(registry: &ChainRegistry) -> ChainResult<Vec<Checkpoint>> {
    registry.best_chain()?.get_checkpoints(registry)
}

pub fn run(config: &Config, command: &Command) -> Result<(), String> {
    let registry = open_registry(config)?;
    match command {
        Command::Info => run_info(&registry),
        Command::Verify => {
            run_verify(registry.load_report());
            Ok(())
        }
        Command::ImportChunk { index, file } => {
            if import_chunk(&registry, *index, file)? {
                ui::print_status("✓", &format!("Chunk {} connected", index), StatusType::Success);
                let best = registry.best_chain().map_err(|e| e.to_string())?;
                ui::print_kv("Best height", &best.height().to_string());
                Ok(())
            } else {
                Err(format!("Chunk {} does not connect", index))
            }
        }
        Command::Header { height } => match header_at(&registry, *height).map_err(|e| e.to_string())? {
            Some(header) => {
                print_header(&header);
                Ok(())
            }
            None => Err(format!("No header at height {}", height)),
        },
        Command::Checkpoints { out } => {
            let checkpoints = export_checkpoints(&registry).map_err(|e| e.to_string())?;
            match out {
                Some(path) => {
                    save_checkpoints(path, &checkpoints).map_err(|e| format!("Failed to write checkpoints: {}", e))?;
                    ui::print_status(
                        "✓",
                        &format!("Wrote {} checkpoint(s) to {}", checkpoints.len(), path.display()),
                        StatusType::Success,
                    );
                }
                None => {
                    let json = serde_json::to_string_pretty(&checkpoints).map_err(|e| e.to_string())?;
                    println!("{}", json);
                }
            }
            Ok(())
        }
    }
}

fn run_info(registry: &ChainRegistry) -> Result<(), String> {
    let summaries = chain_summaries(registry).map_err(|e: ChainError| e.to_string())?;
    ui::print_section("Chains");
    for summary in &summaries {
        ui::print_chain(summary);
    }
    if let Ok(best) = registry.best_chain() {
        if best.is_tip_stale(registry).unwrap_or(true) {
            ui::print_status("!", "Best chain tip is stale", StatusType::Warning);
        }
    }
    Ok(())
}

fn run_verify(report: &LoadReport) {
    ui::print_section("Consistency check");
    if report.main_chain_reset {
        ui::print_status("✗", "Main chain did not connect past the last checkpoint and was reset", StatusType::Warning);
    }
    for discarded in &report.discarded {
        ui::print_status("✗", &format!("Discarded {}: {}", discarded.file_name, discarded.reason), StatusType::Warning);
    }
    if !report.main_chain_reset && report.discarded.is_empty() {
        ui::print_status("✓", "All chains are consistent", StatusType::Success);
    }
}

fn print_header(header: &Header) {
    ui::print_section(&format!("Header {}", header.height));
    ui::print_kv("Hash", &header.hash().to_string());
    ui::print_kv("Version", &header.version.to_string());
    ui::print_kv("Previous", &header.prev_hash.to_string());
    ui::print_kv("Merkle root", &header.merkle_root.to_string());
    ui::print_kv("Timestamp", &header.timestamp.to_string());
    ui::print_kv("Bits", &format!("{:#010x}", header.bits));
    ui::print_kv("Nonce", &header.nonce.to_string());
    ui::print_kv("Raw", &hex::encode(header.serialize()));
}
