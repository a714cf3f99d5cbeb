//! Error types for advertisement data

use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors raised while building or converting an advertisement
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdvertisementError {
    #[error("Invalid advertising type: {0} (expected \"broadcast\" or \"peripheral\")")]
    InvalidAdvertisingType(String),

    #[error("Invalid service UUID: {0}")]
    InvalidServiceUuid(String),

    #[error("Invalid manufacturer data for company 0x{company_id:04X}: {reason}")]
    InvalidManufacturerData { company_id: u16, reason: String },
}

/// Result type for advertisement operations
pub type Result<T> = std::result::Result<T, AdvertisementError>;
