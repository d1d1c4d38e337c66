//! Configuration for [`SessionManager`](crate::SessionManager).

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::constants::{SESSION_KEY_STORAGE_KEY, SESSION_STORAGE_KEY};

/// Settings for session persistence and dispatch.
///
/// Every field has a default, so a partial JSON document is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Storage slot holding the session collection
    pub session_storage_key: String,
    /// Storage slot holding the session key map
    pub key_storage_key: String,
    /// Use a random nonce key when the caller does not supply one
    pub randomize_nonce: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            session_storage_key: SESSION_STORAGE_KEY.to_string(),
            key_storage_key: SESSION_KEY_STORAGE_KEY.to_string(),
            randomize_nonce: true,
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
