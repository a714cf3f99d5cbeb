//! Advertisement data model
//!
//! An [`Advertisement`] is the state behind the exported
//! `org.bluez.LEAdvertisement1` object. Nothing beyond type conformance is
//! checked here: the Bluetooth daemon validates the content when the
//! advertisement is registered.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AdvertisementError;

// ----------------------------------------------------------------------------
// Advertising Type
// ----------------------------------------------------------------------------

/// Advertising type reported through the `Type` property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvertisingType {
    /// Non-connectable broadcast
    #[default]
    Broadcast,
    /// Connectable peripheral
    Peripheral,
}

impl AdvertisingType {
    /// Wire string used on the bus
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::Peripheral => "peripheral",
        }
    }
}

impl fmt::Display for AdvertisingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdvertisingType {
    type Err = AdvertisementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "broadcast" => Ok(Self::Broadcast),
            "peripheral" => Ok(Self::Peripheral),
            other => Err(AdvertisementError::InvalidAdvertisingType(other.to_string())),
        }
    }
}

// ----------------------------------------------------------------------------
// Advertisement
// ----------------------------------------------------------------------------

/// Default service UUID list
pub const DEFAULT_SERVICE_UUID: &str = "ABCD";

/// Default manufacturer (company) identifier
pub const DEFAULT_COMPANY_ID: u16 = 0x0123;

/// Default manufacturer payload
pub const DEFAULT_MANUFACTURER_PAYLOAD: [u8; 5] = [1, 2, 3, 4, 5];

/// Default local name
pub const DEFAULT_LOCAL_NAME: &str = "TestAdvertisement";

/// BLE advertisement exposed to the Bluetooth daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    advertising_type: AdvertisingType,
    service_uuids: Vec<String>,
    manufacturer_data: BTreeMap<u16, Vec<u8>>,
    local_name: String,
}

impl Default for Advertisement {
    fn default() -> Self {
        let mut manufacturer_data = BTreeMap::new();
        manufacturer_data.insert(DEFAULT_COMPANY_ID, DEFAULT_MANUFACTURER_PAYLOAD.to_vec());

        Self {
            advertising_type: AdvertisingType::Broadcast,
            service_uuids: vec![DEFAULT_SERVICE_UUID.to_string()],
            manufacturer_data,
            local_name: DEFAULT_LOCAL_NAME.to_string(),
        }
    }
}

impl Advertisement {
    /// Create an advertisement with the default content
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an advertisement with no services and no manufacturer data
    pub fn empty(advertising_type: AdvertisingType, local_name: impl Into<String>) -> Self {
        Self {
            advertising_type,
            service_uuids: Vec::new(),
            manufacturer_data: BTreeMap::new(),
            local_name: local_name.into(),
        }
    }

    pub fn with_advertising_type(mut self, advertising_type: AdvertisingType) -> Self {
        self.advertising_type = advertising_type;
        self
    }

    pub fn with_service_uuids<I, S>(mut self, uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_service_uuids(uuids);
        self
    }

    pub fn with_manufacturer_data(mut self, company_id: u16, payload: impl Into<Vec<u8>>) -> Self {
        self.insert_manufacturer_data(company_id, payload);
        self
    }

    pub fn with_local_name(mut self, name: impl Into<String>) -> Self {
        self.local_name = name.into();
        self
    }

    // ------------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------------

    pub fn advertising_type(&self) -> AdvertisingType {
        self.advertising_type
    }

    pub fn service_uuids(&self) -> &[String] {
        &self.service_uuids
    }

    pub fn manufacturer_data(&self) -> &BTreeMap<u16, Vec<u8>> {
        &self.manufacturer_data
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    // ------------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------------

    pub fn set_advertising_type(&mut self, advertising_type: AdvertisingType) {
        self.advertising_type = advertising_type;
    }

    /// Append a service UUID. Returns `false` if it was already present.
    pub fn add_service_uuid(&mut self, uuid: impl Into<String>) -> bool {
        let uuid = uuid.into();
        if self.service_uuids.contains(&uuid) {
            return false;
        }
        self.service_uuids.push(uuid);
        true
    }

    /// Replace the service UUID list, keeping the first occurrence of duplicates
    pub fn set_service_uuids<I, S>(&mut self, uuids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.service_uuids.clear();
        for uuid in uuids {
            self.add_service_uuid(uuid);
        }
    }

    /// Insert or replace the payload for one company identifier
    pub fn insert_manufacturer_data(&mut self, company_id: u16, payload: impl Into<Vec<u8>>) {
        self.manufacturer_data.insert(company_id, payload.into());
    }

    pub fn set_manufacturer_data(&mut self, data: BTreeMap<u16, Vec<u8>>) {
        self.manufacturer_data = data;
    }

    pub fn set_local_name(&mut self, name: impl Into<String>) {
        self.local_name = name.into();
    }
}

impl fmt::Display for Advertisement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({}, {} service(s), {} manufacturer entr{})",
            self.local_name,
            self.advertising_type,
            self.service_uuids.len(),
            self.manufacturer_data.len(),
            if self.manufacturer_data.len() == 1 { "y" } else { "ies" }
        )
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
