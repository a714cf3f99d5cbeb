//! Command handlers for the bleadv CLI

use std::path::PathBuf;

use bleadv_bluez::{
    select_adapter, unregister_advertisement, AdvertisingManager, BluezSession, Registration,
    StopReason,
};
use tracing::{error, info, warn};

use crate::cli::{Cli, Commands, Overrides};
use crate::config::AppConfig;
use crate::error::{CliError, Result};

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command against the loaded configuration
    pub async fn execute(cli: &Cli, config: AppConfig) -> Result<()> {
        match cli.command() {
            Commands::Advertise(overrides) => {
                Self::handle_advertise_command(cli, config, overrides).await
            }
            Commands::Adapters => Self::handle_adapters_command().await,
            Commands::Unregister(_) => Self::handle_unregister_command(config).await,
            Commands::Show { json, .. } => Self::handle_show_command(&config, json),
            Commands::ExampleConfig => Self::handle_example_config_command(),
        }
    }

    /// Register the advertisement and hold it until stopped
    ///
    /// A rejected registration is returned as an error so the binary exits
    /// non-zero.
    async fn handle_advertise_command(
        cli: &Cli,
        config: AppConfig,
        overrides: Overrides,
    ) -> Result<()> {
        let advertisement = config.advertisement.to_advertisement()?;
        let mut manager = AdvertisingManager::new(config.bluez.clone())?;

        manager.start(advertisement).await?;
        info!(
            "Advertising at {} ({} backend), press Ctrl-C to stop",
            config.bluez.object_path, config.bluez.backend
        );

        let explicit = cli.config.as_ref().map(PathBuf::from);
        let reason = manager
            .run_until_stopped_with_reload(|| {
                let reloaded = AppConfig::load(explicit.as_deref()).and_then(|mut config| {
                    config.apply_overrides(&overrides)?;
                    config.advertisement.to_advertisement()
                });
                match reloaded {
                    Ok(advertisement) => Some(advertisement),
                    Err(e) => {
                        error!("Keeping current advertisement: {}", e);
                        None
                    }
                }
            })
            .await;

        if let Err(e) = manager.stop().await {
            if reason == StopReason::Interrupted {
                return Err(e.into());
            }
            warn!("Cleanup after {} failed: {}", reason, e);
        }

        info!("Advertisement stopped: {}", reason);
        Ok(())
    }

    /// List adapters that expose the advertising manager
    async fn handle_adapters_command() -> Result<()> {
        let session = BluezSession::system().await?;
        let adapters = session.adapters().await?;

        if adapters.is_empty() {
            return Err(CliError::NoAdapters);
        }

        for adapter in adapters {
            println!(
                "{}  {}  {}  powered={}  instances={}/{}  includes=[{}]",
                adapter.path,
                adapter.address.as_deref().unwrap_or("-"),
                adapter.alias.as_deref().unwrap_or("-"),
                adapter
                    .powered
                    .map(|powered| powered.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                adapter.active_instances,
                adapter.supported_instances,
                adapter.supported_includes.join(", ")
            );
        }
        Ok(())
    }

    /// Unregister a registration left behind by an earlier run
    async fn handle_unregister_command(config: AppConfig) -> Result<()> {
        let session = BluezSession::system().await?;
        let objects = session.object_interfaces().await?;
        let registration = Registration {
            adapter_path: select_adapter(
                &objects,
                config.bluez.adapter.as_deref(),
                &config.bluez.fallback_adapter_path,
            )?,
            advertisement_path: config.bluez.object_path,
        };

        match unregister_advertisement(&session, &registration).await {
            Ok(()) => {
                info!(
                    "Unregistered {} from {}",
                    registration.advertisement_path, registration.adapter_path
                );
                Ok(())
            }
            Err(e) if e.is_does_not_exist() => {
                info!(
                    "{} is not registered on {}",
                    registration.advertisement_path, registration.adapter_path
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Print the advertisement the configuration describes
    fn handle_show_command(config: &AppConfig, json: bool) -> Result<()> {
        let advertisement = config.advertisement.to_advertisement()?;

        if json {
            println!("{}", serde_json::to_string_pretty(&advertisement)?);
        } else {
            println!("{}", advertisement);
            println!("  object path: {}", config.bluez.object_path);
            println!(
                "  adapter:     {}",
                config.bluez.adapter.as_deref().unwrap_or("(first available)")
            );
            println!("  backend:     {}", config.bluez.backend);
        }
        Ok(())
    }

    fn handle_example_config_command() -> Result<()> {
        print!("{}", AppConfig::example_config()?);
        Ok(())
    }
}
