//! BlueZ client that registers a BLE advertisement over D-Bus
//!
//! The advertisement is served on the system bus as an
//! `org.bluez.LEAdvertisement1` object, then handed to the adapter's
//! `org.bluez.LEAdvertisingManager1`.
//!
//! ## Architecture
//!
//! - [`config`] - Client configuration and backend selection
//! - [`error`] - Error types and daemon reply classification
//! - [`object`] - The exported advertisement object
//! - [`proxies`] - Proxies for the daemon's interfaces
//! - [`discovery`] - Advertising manager lookup
//! - [`registration`] - The unregister/register sequence
//! - [`session`] - System bus connection
//! - [`advertising`] - Advertiser backends and the advertising manager
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bleadv_bluez::{AdvertisingManager, BluezConfig};
//! use bleadv_core::Advertisement;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = AdvertisingManager::new(BluezConfig::new().with_adapter("hci0"))?;
//!
//! manager.start(Advertisement::new().with_local_name("Demo")).await?;
//! let reason = manager.run_until_stopped().await;
//! println!("stopped: {}", reason);
//! manager.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Backends
//!
//! - **dbus** (default): exports the object itself and issues
//!   `GetManagedObjects`, `UnregisterAdvertisement` and
//!   `RegisterAdvertisement` explicitly.
//! - **bluer** (feature `bluer`, Linux): delegates to the `bluer` crate.

pub mod advertising;
pub mod config;
pub mod discovery;
pub mod error;
pub mod object;
pub mod proxies;
pub mod registration;
pub mod session;

// Public API exports
pub use advertising::{AdvertisingManager, BleAdvertiser, PlatformAdvertiser, StopReason};
pub use config::{Backend, BluezConfig};
pub use discovery::{select_adapter, ObjectInterfaces};
pub use error::{BluezError, BluezResult};
pub use object::{AdvertisementObject, ReleaseSignal};
pub use registration::{register_advertisement, unregister_advertisement, AdvertisingBus, Registration};
pub use session::{AdapterInfo, BluezSession};
