use headerd::{cli, commands, ui, Config};
use std::process;
use tracing::error;

fn main() {
    // Parse command line arguments
    let args = cli::parse_args();

    // Load configuration (use defaults unless config file is provided)
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            ui::print_status("✗", &format!("Invalid configuration: {}", e), ui::StatusType::Error);
            process::exit(2);
        }
    };

    // Initialize logging
    init_logging(&config);

    ui::print_config_summary(&config);

    if let Err(e) = commands::run(&config, &args.command) {
        ui::print_status("✗", &e, ui::StatusType::Error);
        error!("{}", e);
        process::exit(1);
    }
}

fn load_config(args: &cli::Args) -> Result<Config, String> {
    let mut config = if let Some(config_path) = &args.config_path {
        Config::load(config_path)?
    } else if let Some(network) = &args.network {
        Config::for_network(network)?
    } else {
        Config::default()
    };

    // Apply CLI overrides
    config.apply_cli_overrides(args)?;
    Ok(config)
}

fn init_logging(config: &Config) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}
