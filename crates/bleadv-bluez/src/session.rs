//! System bus session with the Bluetooth daemon

use std::collections::HashMap;

use bleadv_core::protocol::{BLUEZ_SERVICE, ROOT_PATH};
use bleadv_core::Advertisement;
use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, info, warn};
use zbus::fdo::{DBusProxy, ObjectManagerProxy};
use zbus::zvariant::ObjectPath;
use zbus::Connection;

use crate::discovery::{advertising_managers, ObjectInterfaces};
use crate::error::{BluezError, BluezResult};
use crate::object::AdvertisementObject;
use crate::proxies::{AdapterProxy, LEAdvertisingManagerProxy};
use crate::registration::AdvertisingBus;

// ----------------------------------------------------------------------------
// Adapter Listing
// ----------------------------------------------------------------------------

/// An adapter exposing the advertising manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterInfo {
    pub path: String,
    pub address: Option<String>,
    pub alias: Option<String>,
    pub powered: Option<bool>,
    pub active_instances: u8,
    pub supported_instances: u8,
    pub supported_includes: Vec<String>,
}

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

/// A cloneable handle to a system bus connection
#[derive(Clone)]
pub struct BluezSession {
    conn: Connection,
}

impl BluezSession {
    /// Connect to the system bus
    pub async fn system() -> BluezResult<Self> {
        let conn = Connection::system().await.map_err(BluezError::Connection)?;
        debug!("Connected to the system bus as {:?}", conn.unique_name());
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Request a well-known name for this connection
    pub async fn request_name(&self, name: &str) -> BluezResult<()> {
        self.conn
            .request_name(name)
            .await
            .map_err(|e| BluezError::NameRequest {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        debug!("Acquired bus name {}", name);
        Ok(())
    }

    /// Serve the advertisement object at its path
    pub async fn export(&self, object: AdvertisementObject) -> BluezResult<()> {
        let path = object.path().to_string();
        let added = self
            .conn
            .object_server()
            .at(path.as_str(), object)
            .await
            .map_err(|e| BluezError::Export {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if !added {
            return Err(BluezError::Export {
                path,
                reason: "an advertisement is already served at this path".to_string(),
            });
        }
        debug!("Exported advertisement object at {}", path);
        Ok(())
    }

    /// Stop serving the advertisement object. Returns whether one was served.
    pub async fn unexport(&self, path: &str) -> BluezResult<bool> {
        let removed = self
            .conn
            .object_server()
            .remove::<AdvertisementObject, _>(path)
            .await?;
        debug!("Removed advertisement object at {}: {}", path, removed);
        Ok(removed)
    }

    /// Replace the content of the exported object
    pub async fn replace_advertisement(
        &self,
        path: &str,
        advertisement: Advertisement,
    ) -> BluezResult<()> {
        let object = self
            .conn
            .object_server()
            .interface::<_, AdvertisementObject>(path)
            .await?;
        object.get_mut().await.replace(advertisement);
        Ok(())
    }

    /// Current content of the exported object
    pub async fn exported_advertisement(&self, path: &str) -> BluezResult<Advertisement> {
        let object = self
            .conn
            .object_server()
            .interface::<_, AdvertisementObject>(path)
            .await?;
        let advertisement = object.get().await.advertisement().clone();
        Ok(advertisement)
    }

    async fn object_manager(&self) -> BluezResult<ObjectManagerProxy<'static>> {
        Ok(ObjectManagerProxy::builder(&self.conn)
            .destination(BLUEZ_SERVICE)?
            .path(ROOT_PATH)?
            .build()
            .await?)
    }

    async fn advertising_manager(
        &self,
        adapter: &str,
    ) -> BluezResult<LEAdvertisingManagerProxy<'static>> {
        Ok(LEAdvertisingManagerProxy::builder(&self.conn)
            .path(adapter.to_string())?
            .build()
            .await?)
    }

    /// Object paths and interface names the daemon manages
    pub async fn object_interfaces(&self) -> BluezResult<ObjectInterfaces> {
        let objects = self.object_manager().await?.get_managed_objects().await?;

        Ok(objects
            .into_iter()
            .map(|(path, interfaces)| {
                (
                    path.as_str().to_string(),
                    interfaces
                        .into_keys()
                        .map(|name| name.as_str().to_string())
                        .collect(),
                )
            })
            .collect())
    }

    /// Adapters exposing the advertising manager, with their instance counts
    pub async fn adapters(&self) -> BluezResult<Vec<AdapterInfo>> {
        let objects = self.object_interfaces().await?;
        let mut adapters = Vec::new();

        for path in advertising_managers(&objects) {
            let manager = self.advertising_manager(path).await?;
            let adapter = AdapterProxy::builder(&self.conn)
                .path(path.to_string())?
                .build()
                .await?;

            adapters.push(AdapterInfo {
                path: path.to_string(),
                address: adapter.address().await.ok(),
                alias: adapter.alias().await.ok(),
                powered: adapter.powered().await.ok(),
                active_instances: manager.active_instances().await.map_err(BluezError::from_call)?,
                supported_instances: manager
                    .supported_instances()
                    .await
                    .map_err(BluezError::from_call)?,
                supported_includes: manager.supported_includes().await.unwrap_or_default(),
            });
        }

        Ok(adapters)
    }

    /// Resolve once the daemon drops off the bus
    ///
    /// Never resolves on a peer-to-peer connection, which has no bus to leave.
    pub async fn wait_for_daemon_exit(&self) -> BluezResult<()> {
        if self.conn.unique_name().is_none() {
            debug!("Peer-to-peer connection, not watching {}", BLUEZ_SERVICE);
            return std::future::pending().await;
        }

        let dbus = DBusProxy::new(&self.conn).await?;
        let mut changes = dbus
            .receive_name_owner_changed_with_args(&[(0, BLUEZ_SERVICE)])
            .await?;

        while let Some(signal) = changes.next().await {
            let args = signal.args()?;
            if args.new_owner().is_none() {
                info!("{} left the bus", BLUEZ_SERVICE);
                return Ok(());
            }
            debug!("{} changed owner", BLUEZ_SERVICE);
        }

        warn!("Name owner stream closed");
        Ok(())
    }
}

#[async_trait::async_trait]
impl AdvertisingBus for BluezSession {
    async fn managed_objects(&self) -> BluezResult<ObjectInterfaces> {
        self.object_interfaces().await
    }

    async fn unregister_advertisement(&self, adapter: &str, advertisement: &str) -> BluezResult<()> {
        let manager = self.advertising_manager(adapter).await?;
        let path = ObjectPath::try_from(advertisement).map_err(zbus::Error::from)?;
        debug!("UnregisterAdvertisement({}) on {}", advertisement, adapter);
        manager
            .unregister_advertisement(&path)
            .await
            .map_err(BluezError::from_call)
    }

    async fn register_advertisement(&self, adapter: &str, advertisement: &str) -> BluezResult<()> {
        let manager = self.advertising_manager(adapter).await?;
        let path = ObjectPath::try_from(advertisement).map_err(zbus::Error::from)?;
        debug!("RegisterAdvertisement({}, {{}}) on {}", advertisement, adapter);
        manager
            .register_advertisement(&path, HashMap::new())
            .await
            .map_err(BluezError::from_call)
    }
}
