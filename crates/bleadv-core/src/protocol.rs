//! BlueZ D-Bus names and well-known paths

// ----------------------------------------------------------------------------
// D-Bus Interfaces
// ----------------------------------------------------------------------------

pub const OBJECT_MANAGER_INTERFACE: &str = "org.freedesktop.DBus.ObjectManager";
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

// ----------------------------------------------------------------------------
// BlueZ Service and Interfaces
// ----------------------------------------------------------------------------

/// Bus name of the Bluetooth daemon
pub const BLUEZ_SERVICE: &str = "org.bluez";

pub const ADAPTER_INTERFACE: &str = "org.bluez.Adapter1";
pub const LE_ADVERTISING_MANAGER_INTERFACE: &str = "org.bluez.LEAdvertisingManager1";
pub const LE_ADVERTISEMENT_INTERFACE: &str = "org.bluez.LEAdvertisement1";

/// Error name BlueZ replies with when unregistering an unknown advertisement
pub const ERROR_DOES_NOT_EXIST: &str = "org.bluez.Error.DoesNotExist";

// ----------------------------------------------------------------------------
// Object Paths
// ----------------------------------------------------------------------------

/// Path the ObjectManager is served at
pub const ROOT_PATH: &str = "/";

/// Path the advertisement object is exported at unless configured otherwise
pub const DEFAULT_ADVERTISEMENT_PATH: &str = "/org/bluez/advertisement/test1";

/// Adapter used when the daemon reports no advertising manager
pub const FALLBACK_ADAPTER_PATH: &str = "/org/bluez/hci0";

/// Prefix of adapter object paths
pub const ADAPTER_PATH_PREFIX: &str = "/org/bluez/";

/// Resolve an adapter name (`hci0`) or full object path to an object path
pub fn adapter_path(adapter: &str) -> String {
    if adapter.starts_with('/') {
        adapter.to_string()
    } else {
        format!("{}{}", ADAPTER_PATH_PREFIX, adapter)
    }
}
