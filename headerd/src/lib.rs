//! headerd - operator tool for a header-chain directory
//!
//! Opens the chains stored under a headers directory and exposes listing,
//! consistency checking, chunk import and checkpoint export.

pub mod cli;
pub mod commands;
pub mod config;
pub mod ui;

pub use cli::Args;
pub use config::Config;
