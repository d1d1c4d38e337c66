//! Secret session keys, stored apart from session records.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SessionError;
use crate::Result;
use crate::constants::SESSION_KEY_STORAGE_KEY;
use crate::crypto::SessionKey;
use crate::policy::PermissionId;
use crate::storage::KeyValueStore;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredKey {
    session_key: String,
}

/// Entries of the key slot, each left as raw JSON so that one bad entry
/// survives rewrites of the others.
type RawKeyMap = BTreeMap<String, Value>;

/// Map of permission identifier to session key, persisted as one JSON blob:
/// `{ "<id>": { "sessionKey": "0x..." } }`.
#[derive(Debug, Clone)]
pub struct SessionKeyStore {
    store: Arc<dyn KeyValueStore>,
    slot: String,
}

impl SessionKeyStore {
    /// A key store using the default storage slot.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_slot(store, SESSION_KEY_STORAGE_KEY)
    }

    pub fn with_slot(store: Arc<dyn KeyValueStore>, slot: impl Into<String>) -> Self {
        SessionKeyStore {
            store,
            slot: slot.into(),
        }
    }

    /// Generate a fresh key. Nothing is persisted.
    pub fn create_key(&self) -> SessionKey {
        SessionKey::generate()
    }

    /// Current entries. A backend failure is returned rather than treated as
    /// an empty map; unparsable text reads as empty.
    fn read_raw(&self) -> Result<RawKeyMap> {
        let Some(text) = self.store.get(&self.slot)? else {
            return Ok(RawKeyMap::new());
        };
        Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
            tracing::warn!(slot = %self.slot, error = %e, "Ignoring malformed session key map");
            RawKeyMap::new()
        }))
    }

    fn write_raw(&self, map: &RawKeyMap) -> Result<()> {
        let text = serde_json::to_string(map)?;
        self.store.set(&self.slot, &text)
    }

    /// Look up the key stored for `id`.
    ///
    /// Returns `None` when nothing is stored or the stored data cannot be
    /// read; neither case is an error.
    pub fn get_key(&self, id: &PermissionId) -> Option<SessionKey> {
        if id.is_empty() {
            return None;
        }
        let mut map = match self.read_raw() {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(slot = %self.slot, error = %e, "Failed to read session keys");
                return None;
            }
        };
        let stored: StoredKey = match serde_json::from_value(map.remove(&id.to_string())?) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(permission_id = %id, error = %e, "Ignoring malformed session key entry");
                return None;
            }
        };
        match stored.session_key.parse() {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(permission_id = %id, error = %e, "Ignoring unparsable session key");
                None
            }
        }
    }

    /// Store `key` under `id`, replacing any previous key.
    pub fn set_key(&self, id: &PermissionId, key: &SessionKey) -> Result<()> {
        if id.is_empty() {
            return Err(SessionError::EmptyPermissionId.into());
        }
        let mut map = self.read_raw()?;
        let stored = StoredKey {
            session_key: key.to_hex().to_string(),
        };
        map.insert(id.to_string(), serde_json::to_value(stored)?);
        self.write_raw(&map)?;
        tracing::debug!(permission_id = %id, "Stored session key");
        Ok(())
    }

    /// Forget the key for `id`. Removing a missing key is not an error.
    pub fn remove_key(&self, id: &PermissionId) -> Result<()> {
        let mut map = self.read_raw()?;
        if map.remove(&id.to_string()).is_some() {
            self.write_raw(&map)?;
        }
        Ok(())
    }

    /// Remove every stored key.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.slot)
    }
}
