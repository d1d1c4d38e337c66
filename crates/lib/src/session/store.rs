//! The persisted session collection.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use super::{SessionCollection, SessionError, SessionRecord};
use crate::Result;
use crate::constants::SESSION_STORAGE_KEY;
use crate::crypto::SessionKey;
use crate::policy::{PermissionId, Policy};
use crate::primitives::{Address, Bytes};
use crate::storage::KeyValueStore;

/// Entries of the collection slot, each left as raw JSON.
type RawCollection = BTreeMap<String, Value>;

/// Typed access to the session collection slot.
///
/// Every write reads the whole collection, changes one entry and rewrites
/// it. Concurrent writers race with last-write-wins. Entries that do not
/// decode are skipped on read but written back untouched.
#[derive(Debug, Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    slot: String,
}

impl SessionStore {
    /// A session store using the default storage slot.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_slot(store, SESSION_STORAGE_KEY)
    }

    pub fn with_slot(store: Arc<dyn KeyValueStore>, slot: impl Into<String>) -> Self {
        SessionStore {
            store,
            slot: slot.into(),
        }
    }

    /// Record a V3 session authorized for `policies`.
    pub fn create_session(
        &self,
        id: &PermissionId,
        smart_account: Address,
        enable_signature: Bytes,
        policies: &[Policy],
        session_key: &SessionKey,
    ) -> Result<()> {
        let record = SessionRecord::new(
            smart_account,
            enable_signature,
            policies.to_vec(),
            session_key.clone(),
        );
        self.insert(id, &record)
    }

    /// Upsert `record` under `id`.
    ///
    /// Fails without writing if the collection cannot be read from the
    /// backend. Only a slot whose text is not a JSON object is replaced.
    pub fn insert(&self, id: &PermissionId, record: &SessionRecord) -> Result<()> {
        if id.is_empty() {
            return Err(SessionError::EmptyPermissionId.into());
        }
        if !record.has_enable_signature() {
            return Err(SessionError::MissingArgument {
                name: "enable_signature",
            }
            .into());
        }
        let mut raw = self.read_raw()?;
        raw.insert(id.to_string(), serde_json::to_value(record)?);
        let text = serde_json::to_string(&raw)?;
        self.store.set(&self.slot, &text)?;
        tracing::debug!(
            permission_id = %id,
            smart_account = %record.smart_account,
            sessions = raw.len(),
            "Stored session record"
        );
        Ok(())
    }

    fn read_raw(&self) -> Result<RawCollection> {
        let Some(text) = self.store.get(&self.slot)? else {
            return Ok(RawCollection::new());
        };
        Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
            tracing::warn!(slot = %self.slot, error = %e, "Replacing malformed session collection");
            RawCollection::new()
        }))
    }

    /// Every stored session that decodes.
    ///
    /// `None` when nothing is stored, the backend read fails, or the stored
    /// text is not a JSON object. A single bad record is skipped.
    pub fn get_all_sessions(&self) -> Option<SessionCollection> {
        let text = match self.store.get(&self.slot) {
            Ok(text) => text?,
            Err(e) => {
                tracing::warn!(slot = %self.slot, error = %e, "Failed to read sessions");
                return None;
            }
        };
        let raw: RawCollection = match serde_json::from_str(&text) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(slot = %self.slot, error = %e, "Ignoring malformed session collection");
                return None;
            }
        };
        Some(
            raw.into_iter()
                .filter_map(|(key, value)| decode_entry(&key, value))
                .collect(),
        )
    }

    pub fn get_session(&self, id: &PermissionId) -> Option<SessionRecord> {
        self.get_all_sessions()?.remove(id)
    }

    /// The sessions whose smart account is `account`.
    pub fn sessions_for_account(&self, account: &Address) -> SessionCollection {
        self.get_all_sessions()
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, record)| record.smart_account == *account)
            .collect()
    }

    /// Remove the whole collection.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.slot)
    }
}

fn decode_entry(key: &str, value: Value) -> Option<(PermissionId, SessionRecord)> {
    let id = match key.parse::<PermissionId>() {
        Ok(id) if !id.is_empty() => id,
        Ok(_) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Skipping session with an invalid identifier");
            return None;
        }
    };
    match serde_json::from_value(value) {
        Ok(record) => Some((id, record)),
        Err(e) => {
            tracing::warn!(permission_id = %id, error = %e, "Skipping malformed session record");
            None
        }
    }
}
