//! Advertiser trait and backend selection

#[cfg(all(target_os = "linux", feature = "bluer"))]
pub mod managed;
pub mod dbus;
pub mod manager;

// Re-export manager types
pub use manager::AdvertisingManager;

use std::fmt;

use bleadv_core::Advertisement;

use crate::config::{Backend, BluezConfig};
use crate::error::BluezResult;

// ----------------------------------------------------------------------------
// Stop Reasons
// ----------------------------------------------------------------------------

/// Why an advertisement stopped being served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Interrupted locally (Ctrl-C)
    Interrupted,
    /// The daemon called `Release`
    Released,
    /// The daemon left the bus
    DaemonGone,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupted => f.write_str("interrupted"),
            Self::Released => f.write_str("released by the daemon"),
            Self::DaemonGone => f.write_str("daemon disconnected"),
        }
    }
}

// ----------------------------------------------------------------------------
// Advertiser Trait
// ----------------------------------------------------------------------------

/// A way of getting an advertisement onto the air through BlueZ
#[async_trait::async_trait]
pub trait BleAdvertiser: Send {
    /// Start advertising `advertisement`
    async fn start_advertising(&mut self, advertisement: &Advertisement) -> BluezResult<()>;

    /// Stop advertising
    async fn stop_advertising(&mut self) -> BluezResult<()>;

    /// Check if currently advertising
    fn is_advertising(&self) -> bool;

    /// Replace the advertised content
    async fn update_advertisement(&mut self, advertisement: &Advertisement) -> BluezResult<()>;

    /// Resolve when the daemon stops using the advertisement
    async fn wait_for_disconnect(&mut self) -> StopReason;
}

// ----------------------------------------------------------------------------
// Backend Selection
// ----------------------------------------------------------------------------

/// Advertiser for the configured backend
pub enum PlatformAdvertiser {
    Dbus(dbus::DbusAdvertiser),
    #[cfg(all(target_os = "linux", feature = "bluer"))]
    Bluer(managed::BluerAdvertiser),
}

impl PlatformAdvertiser {
    /// Create the advertiser for `config.backend`
    pub fn new(config: BluezConfig) -> BluezResult<Self> {
        match config.backend {
            Backend::Dbus => Ok(Self::Dbus(dbus::DbusAdvertiser::new(config))),
            #[cfg(all(target_os = "linux", feature = "bluer"))]
            Backend::Bluer => Ok(Self::Bluer(managed::BluerAdvertiser::new(config))),
            #[cfg(not(all(target_os = "linux", feature = "bluer")))]
            Backend::Bluer => Err(crate::error::BluezError::BackendUnavailable(
                "built without the `bluer` feature".to_string(),
            )),
        }
    }
}

#[async_trait::async_trait]
impl BleAdvertiser for PlatformAdvertiser {
    async fn start_advertising(&mut self, advertisement: &Advertisement) -> BluezResult<()> {
        match self {
            Self::Dbus(ref mut advertiser) => advertiser.start_advertising(advertisement).await,
            #[cfg(all(target_os = "linux", feature = "bluer"))]
            Self::Bluer(ref mut advertiser) => advertiser.start_advertising(advertisement).await,
        }
    }

    async fn stop_advertising(&mut self) -> BluezResult<()> {
        match self {
            Self::Dbus(ref mut advertiser) => advertiser.stop_advertising().await,
            #[cfg(all(target_os = "linux", feature = "bluer"))]
            Self::Bluer(ref mut advertiser) => advertiser.stop_advertising().await,
        }
    }

    fn is_advertising(&self) -> bool {
        match self {
            Self::Dbus(ref advertiser) => advertiser.is_advertising(),
            #[cfg(all(target_os = "linux", feature = "bluer"))]
            Self::Bluer(ref advertiser) => advertiser.is_advertising(),
        }
    }

    async fn update_advertisement(&mut self, advertisement: &Advertisement) -> BluezResult<()> {
        match self {
            Self::Dbus(ref mut advertiser) => advertiser.update_advertisement(advertisement).await,
            #[cfg(all(target_os = "linux", feature = "bluer"))]
            Self::Bluer(ref mut advertiser) => advertiser.update_advertisement(advertisement).await,
        }
    }

    async fn wait_for_disconnect(&mut self) -> StopReason {
        match self {
            Self::Dbus(ref mut advertiser) => advertiser.wait_for_disconnect().await,
            #[cfg(all(target_os = "linux", feature = "bluer"))]
            Self::Bluer(ref mut advertiser) => advertiser.wait_for_disconnect().await,
        }
    }
}
