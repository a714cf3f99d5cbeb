//! bleadv configuration management
//!
//! Configuration is layered with figment, lowest priority first:
//! - built-in defaults
//! - `bleadv.toml` in the working directory
//! - `bleadv/config.toml` in the user configuration directory
//! - the file given with `--config`
//! - environment variables (`BLEADV_`, nested keys separated by `__`,
//!   e.g. `BLEADV_BLUEZ__ADAPTER=hci1`)
//!
//! Command line overrides are applied on top of the extracted configuration.

use std::path::{Path, PathBuf};

use bleadv_bluez::BluezConfig;
use bleadv_core::advertisement::{
    DEFAULT_COMPANY_ID, DEFAULT_LOCAL_NAME, DEFAULT_MANUFACTURER_PAYLOAD, DEFAULT_SERVICE_UUID,
};
use bleadv_core::{Advertisement, AdvertisementError, AdvertisingType};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Overrides;

/// Configuration file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "bleadv.toml";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "BLEADV_";

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the bleadv tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Bus and daemon settings
    pub bluez: BluezConfig,

    /// Advertisement content
    pub advertisement: AdvertisementConfig,
}

/// Advertisement content as written in configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvertisementConfig {
    pub advertising_type: AdvertisingType,
    pub service_uuids: Vec<String>,
    pub local_name: String,
    pub manufacturer_data: Vec<ManufacturerDataConfig>,
}

/// One manufacturer data entry, payload in hex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerDataConfig {
    pub company_id: u16,
    pub data: String,
}

impl Default for AdvertisementConfig {
    fn default() -> Self {
        Self {
            advertising_type: AdvertisingType::Broadcast,
            service_uuids: vec![DEFAULT_SERVICE_UUID.to_string()],
            local_name: DEFAULT_LOCAL_NAME.to_string(),
            manufacturer_data: vec![ManufacturerDataConfig {
                company_id: DEFAULT_COMPANY_ID,
                data: hex::encode(DEFAULT_MANUFACTURER_PAYLOAD),
            }],
        }
    }
}

impl AdvertisementConfig {
    /// Build the advertisement, decoding manufacturer payloads
    pub fn to_advertisement(&self) -> Result<Advertisement, ConfigError> {
        let mut advertisement = Advertisement::empty(self.advertising_type, self.local_name.as_str())
            .with_service_uuids(self.service_uuids.iter().map(String::as_str));

        for entry in &self.manufacturer_data {
            let payload = hex::decode(entry.data.trim()).map_err(|e| {
                AdvertisementError::InvalidManufacturerData {
                    company_id: entry.company_id,
                    reason: e.to_string(),
                }
            })?;
            advertisement.insert_manufacturer_data(entry.company_id, payload);
        }

        Ok(advertisement)
    }
}

// ----------------------------------------------------------------------------
// Configuration Loading Logic
// ----------------------------------------------------------------------------

impl AppConfig {
    /// The layered configuration sources
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(LOCAL_CONFIG_FILE));

        if let Some(path) = Self::user_config_path() {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate the configuration
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::FileSystem(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
        }

        let config: AppConfig = Self::figment(explicit)
            .extract()
            .map_err(|e| ConfigError::Loading(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/bleadv/config.toml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bleadv").join("config.toml"))
    }

    /// Apply command line overrides and revalidate
    pub fn apply_overrides(&mut self, overrides: &Overrides) -> Result<(), ConfigError> {
        if let Some(adapter) = &overrides.adapter {
            self.bluez.adapter = Some(adapter.clone());
        }
        if let Some(path) = &overrides.path {
            self.bluez.object_path = path.clone();
        }
        if let Some(backend) = overrides.backend {
            self.bluez.backend = backend;
        }
        if overrides.no_unregister_stale {
            self.bluez.unregister_stale = false;
        }

        if let Some(name) = &overrides.name {
            self.advertisement.local_name = name.clone();
        }
        if let Some(advertising_type) = overrides.advertising_type {
            self.advertisement.advertising_type = advertising_type;
        }
        if !overrides.service_uuids.is_empty() {
            self.advertisement.service_uuids = overrides.service_uuids.clone();
        }
        if !overrides.manufacturer_data.is_empty() {
            self.advertisement.manufacturer_data = overrides
                .manufacturer_data
                .iter()
                .map(|arg| parse_manufacturer_data(arg))
                .collect::<Result<_, _>>()?;
        }

        self.validate()
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.bluez.object_path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "Object path must be absolute: {}",
                self.bluez.object_path
            )));
        }
        if !self.bluez.fallback_adapter_path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "Fallback adapter path must be absolute: {}",
                self.bluez.fallback_adapter_path
            )));
        }
        if let Some(adapter) = &self.bluez.adapter {
            if adapter.is_empty() {
                return Err(ConfigError::Validation("Adapter must not be empty".to_string()));
            }
        }

        self.advertisement.to_advertisement()?;
        Ok(())
    }

    /// Create example configuration file content
    pub fn example_config() -> Result<String, ConfigError> {
        let example = AppConfig {
            bluez: BluezConfig::default().with_adapter("hci0"),
            ..Default::default()
        };

        let body = toml::to_string_pretty(&example)
            .map_err(|e| ConfigError::Serialization(e.to_string()))?;
        Ok(format!(
            "# bleadv configuration ({} or {})\n\n{}",
            LOCAL_CONFIG_FILE,
            Self::user_config_path()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "~/.config/bleadv/config.toml".to_string()),
            body
        ))
    }
}

/// Parse `COMPANY_ID:HEX`; the id may be decimal or `0x` hex
pub fn parse_manufacturer_data(arg: &str) -> Result<ManufacturerDataConfig, ConfigError> {
    let (id, data) = arg.split_once(':').ok_or_else(|| {
        ConfigError::Validation(format!("Manufacturer data must be ID:HEX, got '{}'", arg))
    })?;

    let id = id.trim();
    let company_id = match id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")) {
        Some(hex_id) => u16::from_str_radix(hex_id, 16),
        None => id.parse(),
    }
    .map_err(|_| ConfigError::Validation(format!("Invalid company identifier: '{}'", id)))?;

    let data = data.trim().to_string();
    hex::decode(&data).map_err(|e| {
        ConfigError::Advertisement(AdvertisementError::InvalidManufacturerData {
            company_id,
            reason: e.to_string(),
        })
    })?;

    Ok(ManufacturerDataConfig { company_id, data })
}

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {0}")]
    Loading(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Invalid advertisement: {0}")]
    Advertisement(#[from] AdvertisementError),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bleadv_bluez::Backend;

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();
        assert_eq!(config.bluez.object_path, "/org/bluez/advertisement/test1");
        assert_eq!(config.advertisement.local_name, "TestAdvertisement");
        assert_eq!(config.advertisement.manufacturer_data[0].data, "0102030405");
        assert!(config.validate().is_ok());

        let advertisement = config.advertisement.to_advertisement().unwrap();
        assert_eq!(advertisement, Advertisement::default());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid = AppConfig::default();
        invalid.bluez.object_path = "relative/path".to_string();
        assert!(matches!(invalid.validate(), Err(ConfigError::Validation(_))));

        let mut invalid = AppConfig::default();
        invalid.advertisement.manufacturer_data[0].data = "0g".to_string();
        assert!(matches!(
            invalid.validate(),
            Err(ConfigError::Advertisement(AdvertisementError::InvalidManufacturerData {
                company_id: 0x0123,
                ..
            }))
        ));
    }

    #[test]
    fn test_manufacturer_data_parsing() {
        let entry = parse_manufacturer_data("0x004C:0215").unwrap();
        assert_eq!(entry.company_id, 0x004C);
        assert_eq!(entry.data, "0215");

        let decimal = parse_manufacturer_data("291:ff").unwrap();
        assert_eq!(decimal.company_id, 0x0123);

        assert!(parse_manufacturer_data("0215").is_err());
        assert!(parse_manufacturer_data("0x1FFFF:00").is_err());
        assert!(parse_manufacturer_data("0x004C:abc").is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::default();
        let overrides = Overrides {
            adapter: Some("hci1".to_string()),
            name: Some("Beacon".to_string()),
            advertising_type: Some(AdvertisingType::Peripheral),
            service_uuids: vec!["180F".to_string()],
            manufacturer_data: vec!["0xFFFF:aabb".to_string()],
            backend: Some(Backend::Dbus),
            no_unregister_stale: true,
            ..Default::default()
        };
        config.apply_overrides(&overrides).unwrap();

        assert_eq!(config.bluez.adapter.as_deref(), Some("hci1"));
        assert!(!config.bluez.unregister_stale);

        let advertisement = config.advertisement.to_advertisement().unwrap();
        assert_eq!(advertisement.local_name(), "Beacon");
        assert_eq!(advertisement.advertising_type(), AdvertisingType::Peripheral);
        assert_eq!(advertisement.service_uuids(), &["180F".to_string()]);
        assert_eq!(advertisement.manufacturer_data().get(&0xFFFF), Some(&vec![0xAA, 0xBB]));
        assert_eq!(advertisement.manufacturer_data().len(), 1);
    }

    #[test]
    fn test_layered_loading() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_CONFIG_FILE,
                r#"
                [bluez]
                adapter = "hci1"

                [advertisement]
                advertising_type = "peripheral"
                local_name = "FromFile"

                [[advertisement.manufacturer_data]]
                company_id = 0x004C
                data = "0215"
                "#,
            )?;
            jail.set_env("BLEADV_ADVERTISEMENT__LOCAL_NAME", "FromEnv");

            let config = AppConfig::figment(None).extract::<AppConfig>()?;
            assert_eq!(config.bluez.adapter.as_deref(), Some("hci1"));
            assert_eq!(config.bluez.object_path, "/org/bluez/advertisement/test1");
            assert_eq!(config.advertisement.advertising_type, AdvertisingType::Peripheral);
            assert_eq!(config.advertisement.local_name, "FromEnv");
            assert_eq!(config.advertisement.service_uuids, vec!["ABCD".to_string()]);
            assert_eq!(
                config.advertisement.manufacturer_data,
                vec![ManufacturerDataConfig {
                    company_id: 0x004C,
                    data: "0215".to_string(),
                }]
            );
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/bleadv.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileSystem(_)));
    }

    #[test]
    fn test_example_config_generation() {
        let example = AppConfig::example_config().unwrap();
        assert!(example.contains("[bluez]"));
        assert!(example.contains("[advertisement]"));
        assert!(example.contains("[[advertisement.manufacturer_data]]"));
        assert!(example.contains("adapter = \"hci0\""));

        let body: AppConfig = toml::from_str(
            example
                .split_once("\n\n")
                .map(|(_, body)| body)
                .unwrap_or(&example),
        )
        .unwrap();
        assert_eq!(body.bluez.adapter.as_deref(), Some("hci0"));
    }
}
