//! Error handling for the bleadv CLI

use thiserror::Error;

use crate::config::ConfigError;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("BlueZ error: {0}")]
    Bluez(#[from] bleadv_bluez::BluezError),

    #[error("Invalid advertisement: {0}")]
    Advertisement(#[from] bleadv_core::AdvertisementError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No adapter supports LE advertising")]
    NoAdapters,
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
