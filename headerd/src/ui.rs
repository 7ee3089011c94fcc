//! Console output helpers

use crate::commands::ChainSummary;

/// ANSI color codes for terminal output
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const BRIGHT_RED: &str = "\x1b[91m";
    pub const BRIGHT_GREEN: &str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const BRIGHT_CYAN: &str = "\x1b[96m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";
}

/// Status types for colored output
#[derive(Debug, Clone, Copy)]
pub enum StatusType {
    Success,
    Info,
    Warning,
    Error,
}

/// Print status line with icon and color
pub fn print_status(icon: &str, message: &str, status: StatusType) {
    let color = match status {
        StatusType::Success => colors::BRIGHT_GREEN,
        StatusType::Info => colors::BRIGHT_CYAN,
        StatusType::Warning => colors::BRIGHT_YELLOW,
        StatusType::Error => colors::BRIGHT_RED,
    };

    println!("{}[{}]{} {} {}{}", color, icon, colors::RESET, color, message, colors::RESET);
}

/// Print a section header
pub fn print_section(title: &str) {
    println!();
    println!("{}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{}", colors::DIM, colors::RESET);
    println!("{}  {}{}{}", colors::BRIGHT_CYAN, colors::BOLD, title, colors::RESET);
    println!("{}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{}", colors::DIM, colors::RESET);
    println!();
}

/// Print key-value pair in a formatted way
pub fn print_kv(key: &str, value: &str) {
    println!("  {}{}:{} {}{}{}", colors::BRIGHT_WHITE, key, colors::RESET, colors::BRIGHT_CYAN, value, colors::RESET);
}

/// Print configuration summary
pub fn print_config_summary(config: &crate::config::Config) {
    print_section("Configuration");

    print_kv("Network", &config.network.network_id.to_string());
    print_kv("Headers Directory", &config.storage.headers_dir.display().to_string());
    print_kv(
        "Checkpoints",
        &config.network.checkpoints_file.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "none".to_string()),
    );
}

pub fn print_chain(chain: &ChainSummary) {
    let marker = if chain.is_main { "*" } else { " " };
    let parent = chain.parent.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
    println!(
        "  {}{}{} {:<12} {:<10} forkpoint {:>8}  height {:>8}  branch {:>6}  parent {:<8}  work {:#x}",
        colors::BRIGHT_GREEN,
        marker,
        colors::RESET,
        chain.name,
        chain.handle.to_string(),
        chain.forkpoint,
        chain.height,
        chain.branch_size,
        parent,
        chain.chainwork,
    );
}
