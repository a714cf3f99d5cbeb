//! The register sequence against `org.bluez.LEAdvertisingManager1`

use tracing::{debug, info, warn};

use crate::config::BluezConfig;
use crate::discovery::{select_adapter, ObjectInterfaces};
use crate::error::BluezResult;

// ----------------------------------------------------------------------------
// Bus Seam
// ----------------------------------------------------------------------------

/// The remote calls the register sequence is made of
#[async_trait::async_trait]
pub trait AdvertisingBus: Send + Sync {
    /// `ObjectManager.GetManagedObjects` on the daemon root
    async fn managed_objects(&self) -> BluezResult<ObjectInterfaces>;

    /// `LEAdvertisingManager1.UnregisterAdvertisement` on `adapter`
    async fn unregister_advertisement(&self, adapter: &str, advertisement: &str) -> BluezResult<()>;

    /// `LEAdvertisingManager1.RegisterAdvertisement` on `adapter`, no options
    async fn register_advertisement(&self, adapter: &str, advertisement: &str) -> BluezResult<()>;
}

// ----------------------------------------------------------------------------
// Registration
// ----------------------------------------------------------------------------

/// A registered advertisement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub adapter_path: String,
    pub advertisement_path: String,
}

/// Locate the advertising manager, drop any stale registration and register
/// the object at `config.object_path`
///
/// The advertisement object must already be served on the bus.
pub async fn register_advertisement<B>(bus: &B, config: &BluezConfig) -> BluezResult<Registration>
where
    B: AdvertisingBus + ?Sized,
{
    let objects = bus.managed_objects().await?;
    debug!("Daemon reported {} managed objects", objects.len());

    let adapter_path = select_adapter(
        &objects,
        config.adapter.as_deref(),
        &config.fallback_adapter_path,
    )?;
    let advertisement_path = config.object_path.clone();

    if config.unregister_stale {
        match bus
            .unregister_advertisement(&adapter_path, &advertisement_path)
            .await
        {
            Ok(()) => debug!("Unregistered stale advertisement {}", advertisement_path),
            Err(e) if e.is_does_not_exist() => {
                debug!("No stale advertisement at {}", advertisement_path)
            }
            Err(e) => warn!("Ignoring failure to unregister {}: {}", advertisement_path, e),
        }
    }

    bus.register_advertisement(&adapter_path, &advertisement_path)
        .await?;
    info!("Advertisement registered on {}", adapter_path);

    Ok(Registration {
        adapter_path,
        advertisement_path,
    })
}

/// Unregister a previous registration
pub async fn unregister_advertisement<B>(bus: &B, registration: &Registration) -> BluezResult<()>
where
    B: AdvertisingBus + ?Sized,
{
    bus.unregister_advertisement(&registration.adapter_path, &registration.advertisement_path)
        .await?;
    info!(
        "Advertisement {} unregistered from {}",
        registration.advertisement_path, registration.adapter_path
    );
    Ok(())
}
