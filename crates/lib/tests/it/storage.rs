use std::sync::Arc;

use smart_session::SessionManager;
use smart_session::policy::{Policy, compute_id};
use smart_session::storage::{FileStore, KeyValueStore};

use super::helpers::*;

#[test]
fn test_sessions_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    let policies = sudo_and_gas();
    let id = compute_id(Some(&policies));

    {
        let manager = SessionManager::new(Arc::new(FileStore::open(&path).unwrap()));
        let key = manager.key_store().create_key();
        manager.key_store().set_key(&id, &key).unwrap();
        manager
            .session_store()
            .create_session(&id, ACCOUNT, enable_signature(), &policies, &key)
            .unwrap();
    }

    let manager = SessionManager::new(Arc::new(FileStore::open(&path).unwrap()));
    let record = manager.session_store().get_session(&id).unwrap();
    assert_eq!(record.smart_account, ACCOUNT);
    assert_eq!(record.policies, policies);
    assert_eq!(manager.key_store().get_key(&id), Some(record.session_key));
}

#[test]
fn test_corrupt_slot_in_file_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    let store = Arc::new(FileStore::open(&path).unwrap());
    store.set("kernel_session", "definitely not json").unwrap();
    store.set("kernel_session_keys", "[1, 2").unwrap();

    let manager = SessionManager::new(store);
    let id = compute_id(Some(&[Policy::sudo()]));
    assert!(manager.session_store().get_all_sessions().is_none());
    assert!(manager.key_store().get_key(&id).is_none());
}

#[test]
fn test_backend_write_failure_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    // A path inside a missing directory cannot be written
    let path = dir.path().join("missing").join("sessions.json");
    let manager = SessionManager::new(Arc::new(FileStore::open(&path).unwrap()));
    let id = compute_id(Some(&[Policy::sudo()]));

    let err = manager
        .key_store()
        .set_key(&id, &manager.key_store().create_key())
        .unwrap_err();
    assert!(err.is_io_error());
    assert_eq!(err.module(), "storage");
}
