//! The `org.bluez.LEAdvertisement1` object served to the daemon

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bleadv_core::{Advertisement, AdvertisingType};
use tokio::sync::Notify;
use tracing::{debug, info};
use zbus::fdo;
use zbus::interface;
use zbus::zvariant::{OwnedValue, Value};

// ----------------------------------------------------------------------------
// Release Signal
// ----------------------------------------------------------------------------

/// Hands `Release` calls from the daemon to the waiting side
///
/// The daemon also calls `Release` when we unregister the advertisement
/// ourselves. Those calls are announced with [`expect_release`] beforehand and
/// are swallowed instead of ending the wait.
///
/// [`expect_release`]: ReleaseSignal::expect_release
#[derive(Debug, Default)]
pub struct ReleaseSignal {
    notify: Notify,
    expected: AtomicUsize,
}

impl ReleaseSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce that an unregister we issue will be answered by `Release`
    pub fn expect_release(&self) {
        self.expected.fetch_add(1, Ordering::SeqCst);
    }

    /// Withdraw an announcement whose unregister call failed
    pub fn cancel_expected(&self) {
        let _ = self
            .expected
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// Record a `Release` call. Returns false when it answered our own
    /// unregister.
    pub fn release(&self) -> bool {
        if self
            .expected
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return false;
        }
        self.notify.notify_one();
        true
    }

    /// Resolve once the daemon released the advertisement on its own
    pub async fn released(&self) {
        self.notify.notified().await
    }
}

// ----------------------------------------------------------------------------
// Advertisement Object
// ----------------------------------------------------------------------------

/// Advertisement state exported on the bus
///
/// BlueZ reads the four properties when the advertisement is registered and
/// calls `Release` when it stops using it.
pub struct AdvertisementObject {
    advertisement: Advertisement,
    path: String,
    released: Arc<ReleaseSignal>,
}

impl AdvertisementObject {
    pub fn new(
        advertisement: Advertisement,
        path: impl Into<String>,
        released: Arc<ReleaseSignal>,
    ) -> Self {
        Self {
            advertisement,
            path: path.into(),
            released,
        }
    }

    pub fn advertisement(&self) -> &Advertisement {
        &self.advertisement
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Swap the exported content; takes effect at the next registration
    pub fn replace(&mut self, advertisement: Advertisement) {
        self.advertisement = advertisement;
    }
}

#[interface(name = "org.bluez.LEAdvertisement1")]
impl AdvertisementObject {
    fn release(&self) {
        if self.released.release() {
            info!("{}: released", self.path);
        } else {
            debug!("{}: released after unregister", self.path);
        }
    }

    #[zbus(property, name = "Type")]
    fn advertising_type(&self) -> String {
        self.advertisement.advertising_type().as_str().to_string()
    }

    #[zbus(property, name = "Type")]
    fn set_advertising_type(&mut self, value: String) -> fdo::Result<()> {
        let advertising_type: AdvertisingType = value
            .parse()
            .map_err(|e: bleadv_core::AdvertisementError| fdo::Error::InvalidArgs(e.to_string()))?;
        self.advertisement.set_advertising_type(advertising_type);
        Ok(())
    }

    #[zbus(property, name = "ServiceUUIDs")]
    fn service_uuids(&self) -> Vec<String> {
        self.advertisement.service_uuids().to_vec()
    }

    /// Writes add to the list rather than replacing it
    #[zbus(property, name = "ServiceUUIDs")]
    fn set_service_uuids(&mut self, uuids: Vec<String>) {
        for uuid in uuids {
            if !self.advertisement.add_service_uuid(uuid.as_str()) {
                debug!("Service UUID {} already advertised", uuid);
            }
        }
    }

    #[zbus(property, name = "ManufacturerData")]
    fn manufacturer_data(&self) -> fdo::Result<HashMap<u16, OwnedValue>> {
        self.advertisement
            .manufacturer_data()
            .iter()
            .map(|(company_id, payload)| {
                Value::from(payload.clone())
                    .try_to_owned()
                    .map(|value| (*company_id, value))
                    .map_err(|e| fdo::Error::Failed(e.to_string()))
            })
            .collect()
    }

    #[zbus(property, name = "ManufacturerData")]
    fn set_manufacturer_data(&mut self, data: HashMap<u16, OwnedValue>) -> fdo::Result<()> {
        let mut unpacked = BTreeMap::new();
        for (company_id, value) in data {
            let payload = payload_bytes(&value).ok_or_else(|| {
                fdo::Error::InvalidArgs(format!(
                    "manufacturer data for 0x{:04X} is not a byte array",
                    company_id
                ))
            })?;
            unpacked.insert(company_id, payload);
        }
        self.advertisement.set_manufacturer_data(unpacked);
        Ok(())
    }

    #[zbus(property, name = "LocalName")]
    fn local_name(&self) -> String {
        self.advertisement.local_name().to_string()
    }

    #[zbus(property, name = "LocalName")]
    fn set_local_name(&mut self, name: String) {
        self.advertisement.set_local_name(name);
    }
}

/// Extract a byte payload, peeling any variant wrapping around it
fn payload_bytes(value: &Value<'_>) -> Option<Vec<u8>> {
    match value {
        Value::Value(inner) => payload_bytes(inner),
        Value::Array(array) => array
            .iter()
            .map(|item| match item {
                Value::U8(byte) => Some(*byte),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
