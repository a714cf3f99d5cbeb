//! Bluetooth service UUID helpers

use uuid::Uuid;

use crate::errors::{AdvertisementError, Result};

/// Bluetooth base UUID `00000000-0000-1000-8000-00805F9B34FB`
pub const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805F9B34FB;

/// Expand a service UUID string into a full 128-bit UUID
///
/// 16-bit (`"ABCD"`) and 32-bit (`"0000ABCD"`) short forms are placed into the
/// Bluetooth base UUID, anything else must be a full UUID. An optional `0x`
/// prefix is accepted on short forms.
pub fn expand_service_uuid(value: &str) -> Result<Uuid> {
    let trimmed = value.trim();
    let short = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    match short.len() {
        4 | 8 if short.bytes().all(|b| b.is_ascii_hexdigit()) => {
            let prefix = u32::from_str_radix(short, 16)
                .map_err(|_| AdvertisementError::InvalidServiceUuid(value.to_string()))?;
            Ok(Uuid::from_u128(BLUETOOTH_BASE_UUID | ((prefix as u128) << 96)))
        }
        _ => Uuid::parse_str(trimmed)
            .map_err(|_| AdvertisementError::InvalidServiceUuid(value.to_string())),
    }
}
