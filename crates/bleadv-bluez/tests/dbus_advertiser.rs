//! D-Bus advertiser tests against an in-process `org.bluez` stand-in
//!
//! The stand-in serves `GetManagedObjects` on `/` and an advertising manager on
//! `/org/bluez/hci0` over a peer-to-peer connection. Like BlueZ it calls
//! `Release` on the advertisement object after a successful unregister.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bleadv_bluez::advertising::dbus::DbusAdvertiser;
use bleadv_bluez::{AdvertisingManager, BleAdvertiser, BluezConfig, BluezError, BluezSession, StopReason};
use bleadv_core::protocol::{
    ADAPTER_INTERFACE, DEFAULT_ADVERTISEMENT_PATH, LE_ADVERTISEMENT_INTERFACE,
    LE_ADVERTISING_MANAGER_INTERFACE,
};
use bleadv_core::{Advertisement, AdvertisingType};
use tokio::net::UnixStream;
use tokio::time::timeout;
use zbus::connection::Builder;
use zbus::fdo::PropertiesProxy;
use zbus::names::InterfaceName;
use zbus::proxy::CacheProperties;
use zbus::zvariant::{OwnedObjectPath, OwnedValue};
use zbus::{interface, Connection, DBusError, Guid};

const ADAPTER_PATH: &str = "/org/bluez/hci0";

// ----------------------------------------------------------------------------
// Daemon Stand-in
// ----------------------------------------------------------------------------

#[derive(Default)]
struct FakeBluez {
    calls: Mutex<Vec<String>>,
    registered: Mutex<BTreeSet<String>>,
    releases: Mutex<Vec<String>>,
    register_error: Mutex<Option<String>>,
}

impl FakeBluez {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn is_registered(&self, path: &str) -> bool {
        self.registered.lock().unwrap().contains(path)
    }
}

#[derive(Debug, DBusError)]
#[zbus(prefix = "org.bluez.Error")]
enum BluezReply {
    #[zbus(error)]
    ZBus(zbus::Error),
    DoesNotExist(String),
    AlreadyExists(String),
    Failed(String),
}

struct FakeObjectManager {
    bluez: Arc<FakeBluez>,
}

#[interface(name = "org.freedesktop.DBus.ObjectManager")]
impl FakeObjectManager {
    fn get_managed_objects(
        &self,
    ) -> HashMap<OwnedObjectPath, HashMap<String, HashMap<String, OwnedValue>>> {
        self.bluez.record("GetManagedObjects".to_string());

        let interfaces = [ADAPTER_INTERFACE, LE_ADVERTISING_MANAGER_INTERFACE]
            .iter()
            .map(|name| (name.to_string(), HashMap::new()))
            .collect();
        let mut objects = HashMap::new();
        objects.insert(OwnedObjectPath::try_from(ADAPTER_PATH).unwrap(), interfaces);
        objects
    }
}

struct FakeAdvertisingManager {
    bluez: Arc<FakeBluez>,
}

#[interface(name = "org.bluez.LEAdvertisingManager1")]
impl FakeAdvertisingManager {
    async fn register_advertisement(
        &self,
        advertisement: OwnedObjectPath,
        _options: HashMap<String, OwnedValue>,
    ) -> Result<(), BluezReply> {
        let path = advertisement.as_str().to_string();
        self.bluez.record(format!("RegisterAdvertisement {}", path));

        if let Some(message) = self.bluez.register_error.lock().unwrap().clone() {
            return Err(BluezReply::Failed(message));
        }
        if !self.bluez.registered.lock().unwrap().insert(path) {
            return Err(BluezReply::AlreadyExists("Already Exists".to_string()));
        }
        Ok(())
    }

    async fn unregister_advertisement(
        &self,
        #[zbus(connection)] conn: &Connection,
        advertisement: OwnedObjectPath,
    ) -> Result<(), BluezReply> {
        let path = advertisement.as_str().to_string();
        self.bluez.record(format!("UnregisterAdvertisement {}", path));

        if !self.bluez.registered.lock().unwrap().remove(&path) {
            return Err(BluezReply::DoesNotExist("Does Not Exist".to_string()));
        }

        // Released asynchronously, after the reply
        let conn = conn.clone();
        let bluez = self.bluez.clone();
        tokio::spawn(async move {
            let outcome = conn
                .call_method(
                    None::<&str>,
                    path.as_str(),
                    Some(LE_ADVERTISEMENT_INTERFACE),
                    "Release",
                    &(),
                )
                .await;
            let status = if outcome.is_ok() { "ok" } else { "failed" };
            bluez.releases.lock().unwrap().push(format!("{} {}", path, status));
        });
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Fixture
// ----------------------------------------------------------------------------

struct Fixture {
    bluez: Arc<FakeBluez>,
    daemon: Connection,
    session: BluezSession,
}

async fn fixture() -> Fixture {
    let bluez = Arc::new(FakeBluez::default());
    let (client_stream, daemon_stream) = UnixStream::pair().unwrap();

    let (client, daemon) = futures::try_join!(
        Builder::unix_stream(client_stream).p2p().build(),
        Builder::unix_stream(daemon_stream)
            .server(Guid::generate())
            .unwrap()
            .p2p()
            .serve_at("/", FakeObjectManager { bluez: bluez.clone() })
            .unwrap()
            .serve_at(ADAPTER_PATH, FakeAdvertisingManager { bluez: bluez.clone() })
            .unwrap()
            .build(),
    )
    .unwrap();

    Fixture {
        bluez,
        daemon,
        session: BluezSession::from_connection(client),
    }
}

impl Fixture {
    fn advertiser(&self, config: BluezConfig) -> DbusAdvertiser {
        DbusAdvertiser::with_session(config, self.session.clone())
    }

    /// Call `Release` on the exported object the way the daemon does
    async fn release(&self) {
        self.daemon
            .call_method(
                None::<&str>,
                DEFAULT_ADVERTISEMENT_PATH,
                Some(LE_ADVERTISEMENT_INTERFACE),
                "Release",
                &(),
            )
            .await
            .unwrap();
    }

    async fn wait_for_releases(&self, count: usize) {
        timeout(Duration::from_secs(2), async {
            while self.bluez.releases.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("release callback was not delivered");
    }

    async fn exported_property(&self, name: &str) -> OwnedValue {
        let properties = PropertiesProxy::builder(&self.daemon)
            .destination("org.bleadv.Client")
            .unwrap()
            .path(DEFAULT_ADVERTISEMENT_PATH)
            .unwrap()
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .unwrap();
        properties
            .get(InterfaceName::try_from(LE_ADVERTISEMENT_INTERFACE).unwrap(), name)
            .await
            .unwrap()
    }
}

fn unregister_call() -> String {
    format!("UnregisterAdvertisement {}", DEFAULT_ADVERTISEMENT_PATH)
}

fn register_call() -> String {
    format!("RegisterAdvertisement {}", DEFAULT_ADVERTISEMENT_PATH)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_start_update_stop_sequence() {
    let fixture = fixture().await;
    let mut advertiser = fixture.advertiser(BluezConfig::default());

    advertiser.start_advertising(&Advertisement::new()).await.unwrap();
    assert!(advertiser.is_advertising());
    assert!(fixture.bluez.is_registered(DEFAULT_ADVERTISEMENT_PATH));
    assert_eq!(
        fixture.bluez.calls(),
        vec!["GetManagedObjects".to_string(), unregister_call(), register_call()]
    );
    let local_name = fixture.exported_property("LocalName").await;
    assert_eq!(String::try_from(local_name).unwrap(), "TestAdvertisement");

    let peripheral = Advertisement::new().with_advertising_type(AdvertisingType::Peripheral);
    advertiser.update_advertisement(&peripheral).await.unwrap();
    assert!(advertiser.is_advertising());
    assert_eq!(
        fixture.bluez.calls()[3..],
        [
            unregister_call(),
            "GetManagedObjects".to_string(),
            unregister_call(),
            register_call(),
        ]
    );
    let advertising_type = fixture.exported_property("Type").await;
    assert_eq!(String::try_from(advertising_type).unwrap(), "peripheral");

    advertiser.stop_advertising().await.unwrap();
    assert!(!advertiser.is_advertising());
    assert_eq!(fixture.bluez.calls().last(), Some(&unregister_call()));
    assert!(!fixture.bluez.is_registered(DEFAULT_ADVERTISEMENT_PATH));
    assert!(fixture
        .session
        .exported_advertisement(DEFAULT_ADVERTISEMENT_PATH)
        .await
        .is_err());
}

#[tokio::test]
async fn test_update_keeps_advertising_after_own_release() {
    let fixture = fixture().await;
    let mut manager =
        AdvertisingManager::with_advertiser(fixture.advertiser(BluezConfig::default()));

    manager.start(Advertisement::new()).await.unwrap();
    manager
        .update(Advertisement::new().with_local_name("Reloaded"))
        .await
        .unwrap();

    // The daemon answers our unregister with Release
    fixture.wait_for_releases(1).await;
    assert!(timeout(Duration::from_millis(300), manager.run_until_stopped())
        .await
        .is_err());
    assert!(manager.is_advertising());
    assert!(fixture.bluez.is_registered(DEFAULT_ADVERTISEMENT_PATH));

    // A release the daemon initiates still ends the wait
    fixture.release().await;
    let reason = timeout(Duration::from_secs(1), manager.run_until_stopped())
        .await
        .unwrap();
    assert_eq!(reason, StopReason::Released);
}

#[tokio::test]
async fn test_daemon_release_ends_wait() {
    let fixture = fixture().await;
    let mut advertiser = fixture.advertiser(BluezConfig::default());
    advertiser.start_advertising(&Advertisement::new()).await.unwrap();

    fixture.release().await;
    let reason = timeout(Duration::from_secs(1), advertiser.wait_for_disconnect())
        .await
        .unwrap();
    assert_eq!(reason, StopReason::Released);
    assert!(advertiser.registration().is_none());
    assert!(!advertiser.is_advertising());

    // Nothing left to unregister, only the object is removed
    advertiser.stop_advertising().await.unwrap();
    assert_eq!(fixture.bluez.calls().last(), Some(&register_call()));
}

#[tokio::test]
async fn test_registration_failure_removes_object() {
    let fixture = fixture().await;
    *fixture.bluez.register_error.lock().unwrap() =
        Some("Maximum advertisements reached".to_string());
    let mut advertiser = fixture.advertiser(BluezConfig::default());

    let err = advertiser
        .start_advertising(&Advertisement::new())
        .await
        .unwrap_err();
    match err {
        BluezError::Daemon { name, message } => {
            assert_eq!(name, "org.bluez.Error.Failed");
            assert_eq!(message, "Maximum advertisements reached");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(!advertiser.is_advertising());
    assert!(fixture
        .session
        .exported_advertisement(DEFAULT_ADVERTISEMENT_PATH)
        .await
        .is_err());

    // A later attempt can export again at the same path
    *fixture.bluez.register_error.lock().unwrap() = None;
    tokio_test::assert_ok!(advertiser.start_advertising(&Advertisement::new()).await);
}

#[tokio::test]
async fn test_stop_leaves_registration_when_configured() {
    let fixture = fixture().await;
    let mut advertiser =
        fixture.advertiser(BluezConfig::default().with_unregister_on_stop(false));

    advertiser.start_advertising(&Advertisement::new()).await.unwrap();
    advertiser.stop_advertising().await.unwrap();

    assert_eq!(fixture.bluez.calls().last(), Some(&register_call()));
    assert!(fixture.bluez.is_registered(DEFAULT_ADVERTISEMENT_PATH));
}
