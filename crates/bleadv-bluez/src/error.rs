//! Error types for the BlueZ client

use bleadv_core::protocol::ERROR_DOES_NOT_EXIST;
use bleadv_core::AdvertisementError;
use thiserror::Error;
use zbus::DBusError;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors raised while talking to the Bluetooth daemon
#[derive(Error, Debug)]
pub enum BluezError {
    #[error("Failed to connect to the system bus: {0}")]
    Connection(#[source] zbus::Error),

    #[error("Failed to acquire bus name {name}: {reason}")]
    NameRequest { name: String, reason: String },

    #[error("Failed to export advertisement at {path}: {reason}")]
    Export { path: String, reason: String },

    #[error("Adapter not found: {adapter}")]
    AdapterNotFound { adapter: String },

    /// Error reply sent by the daemon
    #[error("{name}: {message}")]
    Daemon { name: String, message: String },

    #[error("Advertising backend not available: {0}")]
    BackendUnavailable(String),

    #[error("Advertisement is not active")]
    NotAdvertising,

    #[error("Invalid advertisement: {0}")]
    Advertisement(#[from] AdvertisementError),

    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),
}

impl BluezError {
    /// Classify the failure of a remote call
    ///
    /// Error replies become [`BluezError::Daemon`], everything else stays a
    /// transport-level D-Bus error.
    pub fn from_call(err: zbus::Error) -> Self {
        match err {
            zbus::Error::MethodError(name, message, _) => Self::Daemon {
                name: name.as_str().to_string(),
                message: message.unwrap_or_default(),
            },
            zbus::Error::FDO(fdo) => Self::Daemon {
                name: fdo.name().as_str().to_string(),
                message: fdo.description().unwrap_or_default().to_string(),
            },
            other => Self::Dbus(other),
        }
    }

    /// Whether the daemon reported that the object is not registered
    pub fn is_does_not_exist(&self) -> bool {
        matches!(self, Self::Daemon { name, .. } if name == ERROR_DOES_NOT_EXIST)
    }
}

impl From<zbus::fdo::Error> for BluezError {
    fn from(err: zbus::fdo::Error) -> Self {
        Self::from_call(zbus::Error::from(err))
    }
}

/// Result type for BlueZ operations
pub type BluezResult<T> = std::result::Result<T, BluezError>;
