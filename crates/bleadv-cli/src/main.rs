//! bleadv - register a BLE advertisement with BlueZ

use std::path::Path;

use clap::Parser;
use tracing::{debug, error};

use bleadv_cli::{cli::Cli, commands::CommandDispatcher, config::AppConfig, error::Result};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    setup_logging(cli.verbose);

    // Load configuration
    let config = match load_configuration(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    // Execute the command
    if let Err(e) = CommandDispatcher::execute(&cli, config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Load layered configuration and apply the command's overrides
fn load_configuration(cli: &Cli) -> Result<AppConfig> {
    let explicit = cli.config.as_deref().map(Path::new);
    if let Some(path) = explicit {
        debug!("Loading configuration from: {}", path.display());
    }

    let mut config = AppConfig::load(explicit)?;
    if let Some(overrides) = cli.command().overrides() {
        config.apply_overrides(overrides)?;
    }
    Ok(config)
}
