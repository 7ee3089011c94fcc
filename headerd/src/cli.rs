use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "headerd")]
#[command(about = "Inspect and maintain a header-chain directory", long_about = None)]
pub struct Args {
    /// Path to configuration file (optional, uses defaults if not provided)
    #[arg(short, long)]
    pub config_path: Option<PathBuf>,

    /// Directory holding blockchain_headers and forks/
    #[arg(short = 'd', long)]
    pub headers_dir: Option<PathBuf>,

    /// Network (mainnet, testnet, simnet)
    #[arg(short, long)]
    pub network: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides [logging] level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Checkpoints JSON file
    #[arg(long)]
    pub checkpoints: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every chain with its forkpoint, height and work
    Info,
    /// Run the startup consistency pass and report what it dropped
    Verify,
    /// Connect a hex-encoded chunk file to the best chain
    ImportChunk {
        /// Chunk index (heights index*2016 ..)
        index: i64,
        /// File with the chunk as hex
        file: PathBuf,
    },
    /// Print the best chain's header at a height
    Header {
        height: i64,
    },
    /// Export the best chain's full chunks as checkpoints JSON
    Checkpoints {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_import_chunk() {
        let args = Args::try_parse_from(["headerd", "-n", "simnet", "-d", "/tmp/h", "import-chunk", "3", "chunk.hex"]).unwrap();
        assert_eq!(args.network.as_deref(), Some("simnet"));
        assert_eq!(args.headers_dir, Some(PathBuf::from("/tmp/h")));
        assert_eq!(args.log_level, None);
        assert_eq!(args.command, Command::ImportChunk { index: 3, file: PathBuf::from("chunk.hex") });
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from(["headerd"]).is_err());
        let args = Args::try_parse_from(["headerd", "checkpoints", "--out", "cp.json"]).unwrap();
        assert_eq!(args.command, Command::Checkpoints { out: Some(PathBuf::from("cp.json")) });
    }
}
