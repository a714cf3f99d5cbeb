//! Linux advertising through the bluer crate
//!
//! bluer serves the advertisement object and drives the manager itself; the
//! advertisement stays registered for as long as its handle is held.

use std::collections::BTreeSet;

use bleadv_core::{expand_service_uuid, Advertisement, AdvertisingType};
use tracing::{debug, info};

use crate::config::BluezConfig;
use crate::error::{BluezError, BluezResult};

use super::{BleAdvertiser, StopReason};

// ----------------------------------------------------------------------------
// Linux Implementation
// ----------------------------------------------------------------------------

pub struct BluerAdvertiser {
    config: BluezConfig,
    session: Option<bluer::Session>,
    adapter: Option<bluer::Adapter>,
    advertisement_handle: Option<bluer::adv::AdvertisementHandle>,
}

impl BluerAdvertiser {
    pub fn new(config: BluezConfig) -> Self {
        Self {
            config,
            session: None,
            adapter: None,
            advertisement_handle: None,
        }
    }

    async fn initialize(&mut self) -> BluezResult<bluer::Adapter> {
        if let Some(adapter) = &self.adapter {
            return Ok(adapter.clone());
        }

        let session = bluer::Session::new()
            .await
            .map_err(|e| BluezError::BackendUnavailable(format!("BlueZ session: {}", e)))?;

        let adapter = match &self.config.adapter {
            Some(name) => {
                let name = name.rsplit('/').next().unwrap_or(name.as_str());
                session.adapter(name).map_err(|_| BluezError::AdapterNotFound {
                    adapter: name.to_string(),
                })?
            }
            None => session
                .default_adapter()
                .await
                .map_err(|e| BluezError::BackendUnavailable(format!("BLE adapter: {}", e)))?,
        };

        // Enable adapter if needed
        if !adapter.is_powered().await.unwrap_or(false) {
            adapter.set_powered(true).await.map_err(|e| BluezError::Daemon {
                name: "org.bluez.Error.Failed".to_string(),
                message: format!("Failed to power on adapter: {}", e),
            })?;
        }

        info!("Adapter {} initialized for advertising", adapter.name());
        self.session = Some(session);
        self.adapter = Some(adapter.clone());
        Ok(adapter)
    }
}

/// Convert to bluer's advertisement, expanding service UUIDs
fn to_bluer(advertisement: &Advertisement) -> BluezResult<bluer::adv::Advertisement> {
    let service_uuids = advertisement
        .service_uuids()
        .iter()
        .map(|uuid| expand_service_uuid(uuid))
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(bluer::adv::Advertisement {
        advertisement_type: match advertisement.advertising_type() {
            AdvertisingType::Broadcast => bluer::adv::Type::Broadcast,
            AdvertisingType::Peripheral => bluer::adv::Type::Peripheral,
        },
        service_uuids,
        manufacturer_data: advertisement.manufacturer_data().clone(),
        local_name: Some(advertisement.local_name().to_string()),
        ..Default::default()
    })
}

#[async_trait::async_trait]
impl BleAdvertiser for BluerAdvertiser {
    async fn start_advertising(&mut self, advertisement: &Advertisement) -> BluezResult<()> {
        let adapter = self.initialize().await?;
        let le_advertisement = to_bluer(advertisement)?;

        // Replacing the handle drops the previous advertisement
        self.advertisement_handle = None;
        let handle = adapter
            .advertise(le_advertisement)
            .await
            .map_err(|e| BluezError::Daemon {
                name: format!("{:?}", e.kind),
                message: e.message.clone(),
            })?;

        self.advertisement_handle = Some(handle);
        info!("Started BLE advertising {}", advertisement);
        Ok(())
    }

    async fn stop_advertising(&mut self) -> BluezResult<()> {
        if let Some(handle) = self.advertisement_handle.take() {
            drop(handle); // Dropping the handle stops advertising
            info!("Stopped BLE advertising");
        }
        Ok(())
    }

    fn is_advertising(&self) -> bool {
        self.advertisement_handle.is_some()
    }

    async fn update_advertisement(&mut self, advertisement: &Advertisement) -> BluezResult<()> {
        debug!("Re-advertising with updated content");
        self.start_advertising(advertisement).await
    }

    async fn wait_for_disconnect(&mut self) -> StopReason {
        // bluer releases the advertisement internally; nothing to observe
        std::future::pending().await
    }
}
