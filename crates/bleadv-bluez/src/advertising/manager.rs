//! High-level advertising manager

use bleadv_core::Advertisement;
use tracing::{debug, error, info, warn};

use crate::config::BluezConfig;
use crate::error::{BluezError, BluezResult};

use super::{BleAdvertiser, PlatformAdvertiser, StopReason};

// ----------------------------------------------------------------------------
// Advertising Manager
// ----------------------------------------------------------------------------

/// Drives one advertiser from start to shutdown
pub struct AdvertisingManager<A = PlatformAdvertiser> {
    advertiser: A,
    current: Option<Advertisement>,
}

impl AdvertisingManager<PlatformAdvertiser> {
    /// Create a manager for the configured backend
    pub fn new(config: BluezConfig) -> BluezResult<Self> {
        Ok(Self::with_advertiser(PlatformAdvertiser::new(config)?))
    }
}

impl<A: BleAdvertiser> AdvertisingManager<A> {
    pub fn with_advertiser(advertiser: A) -> Self {
        Self {
            advertiser,
            current: None,
        }
    }

    /// Start advertising
    pub async fn start(&mut self, advertisement: Advertisement) -> BluezResult<()> {
        self.advertiser.start_advertising(&advertisement).await?;
        info!("BLE advertising started: {}", advertisement);
        self.current = Some(advertisement);
        Ok(())
    }

    /// Stop advertising
    pub async fn stop(&mut self) -> BluezResult<()> {
        self.advertiser.stop_advertising().await?;
        self.current = None;
        Ok(())
    }

    /// Check if currently advertising
    pub fn is_advertising(&self) -> bool {
        self.advertiser.is_advertising()
    }

    /// The advertisement last started or updated
    pub fn current(&self) -> Option<&Advertisement> {
        self.current.as_ref()
    }

    /// Replace the advertised content
    pub async fn update(&mut self, advertisement: Advertisement) -> BluezResult<()> {
        if self.current.is_none() {
            return Err(BluezError::NotAdvertising);
        }
        if self.current.as_ref() == Some(&advertisement) {
            debug!("Advertisement unchanged, skipping update");
            return Ok(());
        }

        self.advertiser.update_advertisement(&advertisement).await?;
        self.current = Some(advertisement);
        Ok(())
    }

    /// Wait for Ctrl-C, a daemon release or the daemon leaving the bus
    pub async fn run_until_stopped(&mut self) -> StopReason {
        self.run_until_stopped_with_reload(|| None).await
    }

    /// Like [`run_until_stopped`](Self::run_until_stopped), additionally
    /// calling `reload` on SIGHUP and advertising what it returns
    pub async fn run_until_stopped_with_reload<F>(&mut self, mut reload: F) -> StopReason
    where
        F: FnMut() -> Option<Advertisement> + Send,
    {
        let mut hangup = Hangup::new();

        loop {
            tokio::select! {
                reason = self.advertiser.wait_for_disconnect() => {
                    info!("Advertisement stopped: {}", reason);
                    return reason;
                }
                _ = interrupted() => {
                    info!("Interrupted, shutting down");
                    return StopReason::Interrupted;
                }
                _ = hangup.recv() => {
                    info!("Reloading advertisement");
                    if let Some(advertisement) = reload() {
                        if let Err(e) = self.update(advertisement).await {
                            error!("Failed to update advertisement: {}", e);
                        }
                    }
                }
            }
        }
    }

    pub fn advertiser(&self) -> &A {
        &self.advertiser
    }
}

async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

// ----------------------------------------------------------------------------
// SIGHUP
// ----------------------------------------------------------------------------

struct Hangup {
    #[cfg(unix)]
    signal: Option<tokio::signal::unix::Signal>,
}

impl Hangup {
    #[cfg(unix)]
    fn new() -> Self {
        use tokio::signal::unix::{signal, SignalKind};

        let signal = match signal(SignalKind::hangup()) {
            Ok(signal) => Some(signal),
            Err(e) => {
                warn!("Cannot listen for SIGHUP: {}", e);
                None
            }
        };
        Self { signal }
    }

    #[cfg(not(unix))]
    fn new() -> Self {
        Self {}
    }

    async fn recv(&mut self) {
        #[cfg(unix)]
        if let Some(signal) = self.signal.as_mut() {
            if signal.recv().await.is_some() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}
