//! Header chain management: candidate chains stored as flat header files,
//! the registry that tracks them, and the reorg swap that keeps the chain
//! with the most work in the main file.

pub mod chain;
pub mod chainwork;
pub mod errors;
pub mod registry;
pub mod reorg;
pub mod topology;

pub use chain::{ChainHandle, ChainReader, HeaderChain};
pub use chainwork::ChainworkCache;
pub use errors::{ChainError, ChainResult};
pub use registry::{ChainRegistry, DiscardedChain, LoadReport};
