//! Core types for registering a BLE advertisement with BlueZ
//!
//! This crate carries no I/O. It defines the advertisement that gets exported on
//! the bus and the names used to talk to the Bluetooth daemon.
//!
//! ## Modules
//!
//! - [`advertisement`] - The advertisement data model
//! - [`errors`] - Error type for invalid advertisement data
//! - [`protocol`] - D-Bus service, interface and path constants
//! - [`uuid`] - Expansion of short Bluetooth service UUIDs
//!
//! ## Usage
//!
//! ```rust
//! use bleadv_core::{Advertisement, AdvertisingType};
//!
//! let advertisement = Advertisement::new()
//!     .with_advertising_type(AdvertisingType::Peripheral)
//!     .with_local_name("Thermometer");
//!
//! assert_eq!(advertisement.local_name(), "Thermometer");
//! ```

pub mod advertisement;
pub mod errors;
pub mod protocol;
pub mod uuid;

pub use advertisement::{Advertisement, AdvertisingType};
pub use errors::{AdvertisementError, Result};
pub use self::uuid::expand_service_uuid;
