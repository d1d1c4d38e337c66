use std::sync::Arc;

use smart_session::constants::SESSION_STORAGE_KEY;
use smart_session::crypto::SessionKey;
use smart_session::policy::{
    CallPermission, ParamCondition, PermissionId, Policy, PolicyKind, compute_id,
};
use smart_session::primitives::{Address, Bytes};
use smart_session::provider::ProtocolVersion;
use smart_session::session::{SessionPermissions, SessionRecord, SessionStore};
use smart_session::storage::{InMemory, KeyValueStore};

use crate::helpers::*;

#[test]
fn test_create_session_round_trip() {
    let store = SessionStore::new(Arc::new(InMemory::new()));
    let policies = vec![
        Policy::sudo(),
        Policy::gas(1_000_000_000),
        Policy::timestamp(1_700_000_000, 1_800_000_000),
    ];
    let id = compute_id(Some(&policies));
    let key = SessionKey::generate();
    let account: Address = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".parse().unwrap();
    let signature: Bytes = "0xdeadbeef".parse().unwrap();

    store
        .create_session(&id, account, signature.clone(), &policies, &key)
        .unwrap();

    let sessions = store.get_all_sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    let record = &sessions[&id];
    assert_eq!(record.smart_account, account);
    assert_eq!(record.enable_signature, signature);
    assert_eq!(record.policies, policies);
    assert_eq!(record.policies[2].kind(), PolicyKind::Timestamp);
    assert_eq!(record.session_key, key);
    assert_eq!(record.protocol, ProtocolVersion::V3);
}

#[test]
fn test_stored_layout() {
    let backend = Arc::new(InMemory::new());
    let store = SessionStore::new(backend.clone());
    let policies = sudo_and_gas();
    let id = compute_id(Some(&policies));
    let key = SessionKey::generate();
    store
        .create_session(&id, ACCOUNT, enable_signature(), &policies, &key)
        .unwrap();

    let text = backend.get(SESSION_STORAGE_KEY).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let entry = &json[id.to_string()];
    assert_eq!(entry["smartAccount"], serde_json::to_value(ACCOUNT).unwrap());
    assert_eq!(entry["enableSignature"], "0xdeadbeef");
    assert_eq!(entry["sessionKey"], key.to_hex().as_str());
    assert_eq!(entry["policies"].as_array().unwrap().len(), 2);
}

#[test]
fn test_rewriting_same_record_is_idempotent() {
    let backend = Arc::new(InMemory::new());
    let store = SessionStore::new(backend.clone());
    let policies = sudo_and_gas();
    let id = compute_id(Some(&policies));
    let key = SessionKey::generate();

    store
        .create_session(&id, ACCOUNT, enable_signature(), &policies, &key)
        .unwrap();
    let first = backend.get(SESSION_STORAGE_KEY).unwrap();
    store
        .create_session(&id, ACCOUNT, enable_signature(), &policies, &key)
        .unwrap();
    assert_eq!(backend.get(SESSION_STORAGE_KEY).unwrap(), first);
}

#[test]
fn test_records_accumulate() {
    let store = SessionStore::new(Arc::new(InMemory::new()));
    let a = vec![Policy::sudo()];
    let b = sudo_and_gas();
    store
        .create_session(&compute_id(Some(&a)), ACCOUNT, enable_signature(), &a, &SessionKey::generate())
        .unwrap();
    store
        .create_session(&compute_id(Some(&b)), OTHER_ACCOUNT, enable_signature(), &b, &SessionKey::generate())
        .unwrap();

    assert_eq!(store.get_all_sessions().unwrap().len(), 2);
    assert_eq!(store.sessions_for_account(&ACCOUNT).len(), 1);
    assert_eq!(store.sessions_for_account(&OTHER_ACCOUNT).len(), 1);
}

#[test]
fn test_unparsable_collection_reads_as_absent() {
    let backend = Arc::new(InMemory::new());
    backend.set(SESSION_STORAGE_KEY, "{broken").unwrap();
    let store = SessionStore::new(backend);

    assert!(store.get_all_sessions().is_none());

    // Writing recovers the slot
    let policies = vec![Policy::sudo()];
    let id = compute_id(Some(&policies));
    store
        .create_session(&id, ACCOUNT, enable_signature(), &policies, &SessionKey::generate())
        .unwrap();
    assert_eq!(store.get_all_sessions().unwrap().len(), 1);
}

#[test]
fn test_malformed_record_does_not_hide_others() {
    let backend = Arc::new(InMemory::new());
    let store = SessionStore::new(backend.clone());
    let good: PermissionId = "0x0001".parse().unwrap();
    let bad: PermissionId = "0x0002".parse().unwrap();
    store
        .create_session(&good, ACCOUNT, enable_signature(), &[Policy::sudo()], &SessionKey::generate())
        .unwrap();

    let text = backend.get(SESSION_STORAGE_KEY).unwrap().unwrap();
    let mut json: serde_json::Value = serde_json::from_str(&text).unwrap();
    json["0x0002"] = serde_json::json!({ "smartAccount": 7 });
    backend.set(SESSION_STORAGE_KEY, &json.to_string()).unwrap();

    let sessions = store.get_all_sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(sessions.contains_key(&good));
    assert!(store.get_session(&bad).is_none());

    // A later write keeps both the good record and the unreadable one
    let third: PermissionId = "0x0003".parse().unwrap();
    store
        .create_session(&third, ACCOUNT, enable_signature(), &[Policy::sudo()], &SessionKey::generate())
        .unwrap();
    let text = backend.get(SESSION_STORAGE_KEY).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["0x0001", "0x0002", "0x0003"]);
    assert_eq!(json["0x0002"]["smartAccount"], 7);
    assert_eq!(store.get_all_sessions().unwrap().len(), 2);
}

#[test]
fn test_failed_read_does_not_wipe_collection() {
    let backend = Arc::new(FaultyStore::default());
    let store = SessionStore::new(backend.clone());
    let first = vec![Policy::sudo()];
    let first_id = compute_id(Some(&first));
    store
        .create_session(&first_id, ACCOUNT, enable_signature(), &first, &SessionKey::generate())
        .unwrap();

    backend.fail_reads(1);
    let second = sudo_and_gas();
    let second_id = compute_id(Some(&second));
    let err = store
        .create_session(&second_id, ACCOUNT, enable_signature(), &second, &SessionKey::generate())
        .unwrap_err();
    assert!(err.is_io_error());

    let sessions = store.get_all_sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(sessions.contains_key(&first_id));

    store
        .create_session(&second_id, ACCOUNT, enable_signature(), &second, &SessionKey::generate())
        .unwrap();
    assert_eq!(store.get_all_sessions().unwrap().len(), 2);
}

#[test]
fn test_empty_enable_signature_is_rejected() {
    let store = SessionStore::new(Arc::new(InMemory::new()));
    let policies = vec![Policy::sudo()];
    let err = store
        .create_session(
            &compute_id(Some(&policies)),
            ACCOUNT,
            Bytes::new(),
            &policies,
            &SessionKey::generate(),
        )
        .unwrap_err();
    assert!(err.is_programmer_error());
    assert!(store.get_all_sessions().is_none());
}

#[test]
fn test_v2_record_round_trip() {
    let store = SessionStore::new(Arc::new(InMemory::new()));
    let key = SessionKey::generate();
    let record = SessionRecord::with_permissions(
        ACCOUNT,
        enable_signature(),
        key.clone(),
        SessionPermissions {
            signer: key.address(),
            permissions: vec![
                CallPermission::new(Address::repeat_byte(0x34))
                    .with_value_limit(10)
                    .with_condition(ParamCondition::address_equals(0, ACCOUNT)),
            ],
        },
    );
    let id = "0xbeef".parse().unwrap();
    store.insert(&id, &record).unwrap();

    let back = store.get_session(&id).unwrap();
    assert_eq!(back, record);
    assert_eq!(back.protocol, ProtocolVersion::V2);
    assert!(back.policies.is_empty());
}

#[test]
fn test_empty_id_is_rejected() {
    let store = SessionStore::new(Arc::new(InMemory::new()));
    let err = store
        .create_session(
            &compute_id(None),
            ACCOUNT,
            Bytes::default(),
            &[],
            &SessionKey::generate(),
        )
        .unwrap_err();
    assert!(err.is_programmer_error());
    assert!(store.get_all_sessions().is_none());
}
