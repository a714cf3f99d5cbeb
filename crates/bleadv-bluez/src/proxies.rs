//! Client-side proxies for BlueZ interfaces

use std::collections::HashMap;

use zbus::proxy;
use zbus::zvariant::{ObjectPath, Value};

/// `org.bluez.LEAdvertisingManager1`, served on each adapter path
#[proxy(
    interface = "org.bluez.LEAdvertisingManager1",
    default_service = "org.bluez"
)]
pub trait LEAdvertisingManager {
    /// Register an advertisement object. `options` is reserved by BlueZ.
    fn register_advertisement(
        &self,
        advertisement: &ObjectPath<'_>,
        options: HashMap<&str, &Value<'_>>,
    ) -> zbus::Result<()>;

    fn unregister_advertisement(&self, advertisement: &ObjectPath<'_>) -> zbus::Result<()>;

    /// Number of advertisement instances currently registered
    #[zbus(property)]
    fn active_instances(&self) -> zbus::Result<u8>;

    /// Number of instances the controller still has room for
    #[zbus(property)]
    fn supported_instances(&self) -> zbus::Result<u8>;

    #[zbus(property)]
    fn supported_includes(&self) -> zbus::Result<Vec<String>>;
}

/// The subset of `org.bluez.Adapter1` the `adapters` listing reads
#[proxy(interface = "org.bluez.Adapter1", default_service = "org.bluez")]
pub trait Adapter {
    #[zbus(property)]
    fn address(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn alias(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn powered(&self) -> zbus::Result<bool>;
}
