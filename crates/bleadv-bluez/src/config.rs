//! BlueZ client configuration

use std::fmt;
use std::str::FromStr;

use bleadv_core::protocol::{DEFAULT_ADVERTISEMENT_PATH, FALLBACK_ADAPTER_PATH};
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Backend Selection
// ----------------------------------------------------------------------------

/// How the advertisement reaches the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Export the object and drive `LEAdvertisingManager1` directly
    #[default]
    Dbus,
    /// Hand the advertisement to the `bluer` crate
    Bluer,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dbus => f.write_str("dbus"),
            Self::Bluer => f.write_str("bluer"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dbus" => Ok(Self::Dbus),
            "bluer" => Ok(Self::Bluer),
            other => Err(format!("unknown backend '{}' (expected dbus or bluer)", other)),
        }
    }
}

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for the BlueZ client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BluezConfig {
    /// Object path the advertisement is exported at
    pub object_path: String,
    /// Adapter name (`hci0`) or object path; first advertising manager if unset
    pub adapter: Option<String>,
    /// Adapter path used when the daemon lists no advertising manager
    pub fallback_adapter_path: String,
    /// Well-known bus name to request after connecting
    pub request_name: Option<String>,
    /// Unregister the object path before registering it
    pub unregister_stale: bool,
    /// Unregister the advertisement when stopping
    pub unregister_on_stop: bool,
    /// Advertising backend
    pub backend: Backend,
}

impl Default for BluezConfig {
    fn default() -> Self {
        Self {
            object_path: DEFAULT_ADVERTISEMENT_PATH.to_string(),
            adapter: None,
            fallback_adapter_path: FALLBACK_ADAPTER_PATH.to_string(),
            request_name: None,
            unregister_stale: true,
            unregister_on_stop: true,
            backend: Backend::Dbus,
        }
    }
}

impl BluezConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the advertisement object path
    pub fn with_object_path(mut self, path: impl Into<String>) -> Self {
        self.object_path = path.into();
        self
    }

    /// Pin the adapter to register with
    pub fn with_adapter(mut self, adapter: impl Into<String>) -> Self {
        self.adapter = Some(adapter.into());
        self
    }

    /// Set the fallback adapter path
    pub fn with_fallback_adapter_path(mut self, path: impl Into<String>) -> Self {
        self.fallback_adapter_path = path.into();
        self
    }

    /// Request a well-known bus name after connecting
    pub fn with_request_name(mut self, name: impl Into<String>) -> Self {
        self.request_name = Some(name.into());
        self
    }

    /// Enable or disable the stale unregister step
    pub fn with_unregister_stale(mut self, enabled: bool) -> Self {
        self.unregister_stale = enabled;
        self
    }

    /// Enable or disable unregistering on stop
    pub fn with_unregister_on_stop(mut self, enabled: bool) -> Self {
        self.unregister_on_stop = enabled;
        self
    }

    /// Select the advertising backend
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }
}
