//! Advertising through an exported object and `LEAdvertisingManager1`

use std::sync::Arc;

use bleadv_core::Advertisement;
use tracing::{debug, info, warn};

use crate::config::BluezConfig;
use crate::error::BluezResult;
use crate::object::{AdvertisementObject, ReleaseSignal};
use crate::registration::{register_advertisement, unregister_advertisement, Registration};
use crate::session::BluezSession;

use super::{BleAdvertiser, StopReason};

// ----------------------------------------------------------------------------
// D-Bus Implementation
// ----------------------------------------------------------------------------

pub struct DbusAdvertiser {
    config: BluezConfig,
    session: Option<BluezSession>,
    exported: Option<String>,
    registration: Option<Registration>,
    released: Arc<ReleaseSignal>,
}

impl DbusAdvertiser {
    pub fn new(config: BluezConfig) -> Self {
        Self {
            config,
            session: None,
            exported: None,
            registration: None,
            released: Arc::new(ReleaseSignal::new()),
        }
    }

    /// Reuse an existing bus connection
    pub fn with_session(config: BluezConfig, session: BluezSession) -> Self {
        Self {
            session: Some(session),
            ..Self::new(config)
        }
    }

    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }

    /// Unregister our own registration; the daemon's `Release` reply is not a stop
    async fn unregister_own(
        &self,
        session: &BluezSession,
        registration: &Registration,
    ) -> BluezResult<()> {
        self.released.expect_release();
        let result = unregister_advertisement(session, registration).await;
        if result.is_err() {
            self.released.cancel_expected();
        }
        result
    }

    async fn connect(&mut self) -> BluezResult<BluezSession> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }

        let session = BluezSession::system().await?;
        if let Some(name) = &self.config.request_name {
            session.request_name(name).await?;
        }

        self.session = Some(session.clone());
        Ok(session)
    }
}

#[async_trait::async_trait]
impl BleAdvertiser for DbusAdvertiser {
    async fn start_advertising(&mut self, advertisement: &Advertisement) -> BluezResult<()> {
        if self.exported.is_some() {
            return self.update_advertisement(advertisement).await;
        }

        let session = self.connect().await?;
        let path = self.config.object_path.clone();
        self.released = Arc::new(ReleaseSignal::new());

        session
            .export(AdvertisementObject::new(
                advertisement.clone(),
                path.clone(),
                self.released.clone(),
            ))
            .await?;
        self.exported = Some(path.clone());

        match register_advertisement(&session, &self.config).await {
            Ok(registration) => {
                info!("Started BLE advertising {} at {}", advertisement, path);
                self.registration = Some(registration);
                Ok(())
            }
            Err(e) => {
                if let Err(cleanup) = session.unexport(&path).await {
                    debug!("Failed to remove {} after registration error: {}", path, cleanup);
                }
                self.exported = None;
                Err(e)
            }
        }
    }

    async fn stop_advertising(&mut self) -> BluezResult<()> {
        let Some(session) = self.session.clone() else {
            return Ok(());
        };

        if let Some(registration) = self.registration.take() {
            if self.config.unregister_on_stop {
                if let Err(e) = self.unregister_own(&session, &registration).await {
                    warn!("Failed to unregister {}: {}", registration.advertisement_path, e);
                }
            }
        }

        if let Some(path) = self.exported.take() {
            session.unexport(&path).await?;
            info!("Stopped BLE advertising");
        }
        Ok(())
    }

    fn is_advertising(&self) -> bool {
        self.registration.is_some()
    }

    async fn update_advertisement(&mut self, advertisement: &Advertisement) -> BluezResult<()> {
        let (Some(session), Some(path)) = (self.session.clone(), self.exported.clone()) else {
            return self.start_advertising(advertisement).await;
        };

        session
            .replace_advertisement(&path, advertisement.clone())
            .await?;

        // Properties are only read at registration time
        if let Some(previous) = self.registration.take() {
            if let Err(e) = self.unregister_own(&session, &previous).await {
                debug!("Previous registration already gone: {}", e);
            }
        }
        self.registration = Some(register_advertisement(&session, &self.config).await?);

        info!("Updated BLE advertisement to {}", advertisement);
        Ok(())
    }

    async fn wait_for_disconnect(&mut self) -> StopReason {
        let Some(session) = self.session.clone() else {
            return std::future::pending().await;
        };
        let released = self.released.clone();

        let daemon_gone = async {
            if let Err(e) = session.wait_for_daemon_exit().await {
                warn!("Cannot watch the Bluetooth daemon: {}", e);
                std::future::pending::<()>().await;
            }
        };

        let reason = tokio::select! {
            _ = released.released() => StopReason::Released,
            _ = daemon_gone => StopReason::DaemonGone,
        };

        // Nothing left to unregister once the daemon let go
        self.registration = None;
        reason
    }
}
