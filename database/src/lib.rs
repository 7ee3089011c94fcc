//! Flat-file header storage.
//!
//! Every chain is one file of raw 80-byte header records with no framing.
//! The main chain lives in `blockchain_headers`; forks live under `forks/`
//! with their identity encoded in the file name.

pub mod db;
pub mod errors;
pub mod stores;

pub use db::{ForkFileName, HeadersDir};
pub use errors::{DbError, DbResult};
pub use stores::HeaderFile;
