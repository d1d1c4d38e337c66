use std::sync::Arc;

use smart_session::constants::SESSION_KEY_STORAGE_KEY;
use smart_session::policy::{PermissionId, compute_id};
use smart_session::session::SessionKeyStore;
use smart_session::storage::{InMemory, KeyValueStore};

use crate::helpers::*;

#[test]
fn test_keys_are_independent_per_id() {
    let store = SessionKeyStore::new(Arc::new(InMemory::new()));
    let a = compute_id(Some(&sudo_and_gas()));
    let b = compute_id(Some(&[smart_session::policy::Policy::sudo()]));
    let key_a = store.create_key();
    let key_b = store.create_key();

    store.set_key(&a, &key_a).unwrap();
    store.set_key(&b, &key_b).unwrap();
    assert_eq!(store.get_key(&a), Some(key_a.clone()));
    assert_eq!(store.get_key(&b), Some(key_b));

    store.remove_key(&b).unwrap();
    assert_eq!(store.get_key(&a), Some(key_a));
    assert!(store.get_key(&b).is_none());
}

#[test]
fn test_create_key_does_not_persist() {
    let backend = Arc::new(InMemory::new());
    let store = SessionKeyStore::new(backend.clone());
    let _ = store.create_key();
    assert!(backend.get(SESSION_KEY_STORAGE_KEY).unwrap().is_none());
}

#[test]
fn test_key_blob_is_shared_with_other_clients() {
    // Two stores over the same backend see each other's writes
    let backend = Arc::new(InMemory::new());
    let writer = SessionKeyStore::new(backend.clone());
    let reader = SessionKeyStore::new(backend);
    let id = compute_id(Some(&sudo_and_gas()));
    let key = writer.create_key();

    writer.set_key(&id, &key).unwrap();
    assert_eq!(reader.get_key(&id), Some(key));
}

#[test]
fn test_malformed_blob_is_not_fatal() {
    let backend = Arc::new(InMemory::new());
    backend
        .set(SESSION_KEY_STORAGE_KEY, r#"{"0x1234": "not an object"}"#)
        .unwrap();
    let store = SessionKeyStore::new(backend);
    let id = "0x1234".parse().unwrap();
    assert!(store.get_key(&id).is_none());
}

#[test]
fn test_malformed_entry_does_not_hide_others() {
    let backend = Arc::new(InMemory::new());
    let store = SessionKeyStore::new(backend.clone());
    let good: PermissionId = "0x0001".parse().unwrap();
    let key = store.create_key();
    store.set_key(&good, &key).unwrap();

    let text = backend.get(SESSION_KEY_STORAGE_KEY).unwrap().unwrap();
    let mut json: serde_json::Value = serde_json::from_str(&text).unwrap();
    json["0x0002"] = serde_json::json!("not an object");
    backend.set(SESSION_KEY_STORAGE_KEY, &json.to_string()).unwrap();

    assert_eq!(store.get_key(&good), Some(key.clone()));
    let bad: PermissionId = "0x0002".parse().unwrap();
    assert!(store.get_key(&bad).is_none());

    let third: PermissionId = "0x0003".parse().unwrap();
    store.set_key(&third, &store.create_key()).unwrap();
    let text = backend.get(SESSION_KEY_STORAGE_KEY).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let ids: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(ids, ["0x0001", "0x0002", "0x0003"]);
    assert_eq!(store.get_key(&good), Some(key));
}

#[test]
fn test_failed_read_does_not_wipe_keys() {
    let backend = Arc::new(FaultyStore::default());
    let store = SessionKeyStore::new(backend.clone());
    let first = compute_id(Some(&sudo_and_gas()));
    let key = store.create_key();
    store.set_key(&first, &key).unwrap();

    backend.fail_reads(1);
    let second = compute_id(Some(&[smart_session::policy::Policy::sudo()]));
    let err = store.set_key(&second, &store.create_key()).unwrap_err();
    assert!(err.is_io_error());
    assert_eq!(store.get_key(&first), Some(key.clone()));

    // Removal is guarded the same way
    backend.fail_reads(1);
    assert!(store.remove_key(&first).is_err());
    assert_eq!(store.get_key(&first), Some(key));
}
