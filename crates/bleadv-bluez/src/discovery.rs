//! Advertising manager discovery over the managed object tree

use std::collections::{BTreeMap, BTreeSet};

use bleadv_core::protocol::{adapter_path, LE_ADVERTISING_MANAGER_INTERFACE};
use tracing::{debug, warn};

use crate::error::{BluezError, BluezResult};

/// Object path -> interface names, as reported by `GetManagedObjects`
pub type ObjectInterfaces = BTreeMap<String, BTreeSet<String>>;

/// Paths that expose `org.bluez.LEAdvertisingManager1`, in adapter index
/// order (`hci2` before `hci10`)
pub fn advertising_managers(objects: &ObjectInterfaces) -> Vec<&str> {
    let mut managers: Vec<&str> = objects
        .iter()
        .filter(|(_, interfaces)| interfaces.contains(LE_ADVERTISING_MANAGER_INTERFACE))
        .map(|(path, _)| path.as_str())
        .collect();
    managers.sort_by(|a, b| adapter_order(a).cmp(&adapter_order(b)));
    managers
}

/// Sort key splitting a trailing adapter index off the path
fn adapter_order(path: &str) -> (&str, Option<u64>, &str) {
    let stem = path.trim_end_matches(|c: char| c.is_ascii_digit());
    (stem, path[stem.len()..].parse().ok(), path)
}

/// Pick the adapter to register the advertisement with
///
/// A preferred adapter (name or object path) must expose an advertising
/// manager. Without a preference the lowest adapter index wins, whatever order
/// the daemon listed the objects in, and `fallback` is used when the daemon
/// reports none.
pub fn select_adapter(
    objects: &ObjectInterfaces,
    preferred: Option<&str>,
    fallback: &str,
) -> BluezResult<String> {
    let candidates = advertising_managers(objects);

    if let Some(adapter) = preferred {
        let wanted = adapter_path(adapter);
        return candidates
            .into_iter()
            .find(|path| *path == wanted)
            .map(str::to_string)
            .ok_or_else(|| BluezError::AdapterNotFound {
                adapter: adapter.to_string(),
            });
    }

    match candidates.as_slice() {
        [] => {
            warn!(
                "No {} found, falling back to {}",
                LE_ADVERTISING_MANAGER_INTERFACE, fallback
            );
            Ok(fallback.to_string())
        }
        [only] => Ok(only.to_string()),
        [first, rest @ ..] => {
            debug!("Multiple advertising managers, using {} (others: {:?})", first, rest);
            Ok(first.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bleadv_core::protocol::{ADAPTER_INTERFACE, FALLBACK_ADAPTER_PATH};

    fn objects(entries: &[(&str, Vec<&str>)]) -> ObjectInterfaces {
        entries
            .iter()
            .map(|(path, interfaces)| {
                (
                    path.to_string(),
                    interfaces.iter().map(|name| name.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_first_manager_is_selected() {
        let tree = objects(&[
            ("/org/bluez", vec!["org.bluez.AgentManager1"]),
            ("/org/bluez/hci1", vec![ADAPTER_INTERFACE, LE_ADVERTISING_MANAGER_INTERFACE]),
            ("/org/bluez/hci0", vec![ADAPTER_INTERFACE, LE_ADVERTISING_MANAGER_INTERFACE]),
            ("/org/bluez/hci0/dev_00_11_22_33_44_55", vec!["org.bluez.Device1"]),
        ]);

        assert_eq!(advertising_managers(&tree), vec!["/org/bluez/hci0", "/org/bluez/hci1"]);
        assert_eq!(
            select_adapter(&tree, None, FALLBACK_ADAPTER_PATH).unwrap(),
            "/org/bluez/hci0"
        );
    }

    #[test]
    fn test_adapters_are_ordered_by_index() {
        let tree = objects(&[
            ("/org/bluez/hci10", vec![LE_ADVERTISING_MANAGER_INTERFACE]),
            ("/org/bluez/hci2", vec![LE_ADVERTISING_MANAGER_INTERFACE]),
            ("/org/bluez/hci1", vec![ADAPTER_INTERFACE]),
        ]);

        assert_eq!(
            advertising_managers(&tree),
            vec!["/org/bluez/hci2", "/org/bluez/hci10"]
        );
        assert_eq!(
            select_adapter(&tree, None, FALLBACK_ADAPTER_PATH).unwrap(),
            "/org/bluez/hci2"
        );
    }

    #[test]
    fn test_preferred_adapter() {
        let tree = objects(&[
            ("/org/bluez/hci0", vec![LE_ADVERTISING_MANAGER_INTERFACE]),
            ("/org/bluez/hci1", vec![LE_ADVERTISING_MANAGER_INTERFACE]),
        ]);

        assert_eq!(
            select_adapter(&tree, Some("hci1"), FALLBACK_ADAPTER_PATH).unwrap(),
            "/org/bluez/hci1"
        );
        assert_eq!(
            select_adapter(&tree, Some("/org/bluez/hci1"), FALLBACK_ADAPTER_PATH).unwrap(),
            "/org/bluez/hci1"
        );
        assert!(matches!(
            select_adapter(&tree, Some("hci7"), FALLBACK_ADAPTER_PATH),
            Err(BluezError::AdapterNotFound { adapter }) if adapter == "hci7"
        ));
    }

    #[test]
    fn test_fallback_without_managers() {
        let tree = objects(&[("/org/bluez/hci0", vec![ADAPTER_INTERFACE])]);
        assert_eq!(
            select_adapter(&tree, None, FALLBACK_ADAPTER_PATH).unwrap(),
            FALLBACK_ADAPTER_PATH
        );
        assert_eq!(
            select_adapter(&ObjectInterfaces::new(), None, "/org/bluez/hci3").unwrap(),
            "/org/bluez/hci3"
        );
    }
}
