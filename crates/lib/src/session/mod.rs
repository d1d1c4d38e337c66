//! Persisted session state.
//!
//! A session is a locally generated key plus the record of what the owner
//! authorized it to do. The two halves live in separate storage slots:
//!
//! - [`SessionKeyStore`] maps a [`PermissionId`] to its secret [`SessionKey`]
//! - [`SessionStore`] maps a [`PermissionId`] to its [`SessionRecord`]
//!
//! Both are thin typed views over an injected [`KeyValueStore`](crate::storage::KeyValueStore).
//! Reading absent or malformed state never fails: an unreadable slot yields
//! `None` and a malformed entry is skipped. Writes fail when the backend
//! cannot be read, and carry malformed entries over unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::crypto::SessionKey;
use crate::policy::{CallPermission, EncodedPolicy, PermissionId, Policy};
use crate::primitives::{Address, Bytes};
use crate::provider::ProtocolVersion;

mod errors;
mod keys;
mod store;

pub use errors::SessionError;
pub use keys::SessionKeyStore;
pub use store::SessionStore;

/// The session-key-plugin grant carried by V2 sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPermissions {
    /// Address the plugin expects to sign for the session
    pub signer: Address,
    /// Calls the session may make
    #[serde(default)]
    pub permissions: Vec<CallPermission>,
}

/// Everything persisted about one authorized session.
///
/// Records are written once, after the owner has produced the enable
/// signature, and are never mutated. Re-authorizing writes a new identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub smart_account: Address,
    pub enable_signature: Bytes,
    #[serde(with = "encoded_policies")]
    pub policies: Vec<Policy>,
    pub session_key: SessionKey,
    #[serde(default)]
    pub protocol: ProtocolVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<SessionPermissions>,
}

impl SessionRecord {
    /// A V3 record bound to a policy set.
    pub fn new(
        smart_account: Address,
        enable_signature: Bytes,
        policies: Vec<Policy>,
        session_key: SessionKey,
    ) -> Self {
        SessionRecord {
            smart_account,
            enable_signature,
            policies,
            session_key,
            protocol: ProtocolVersion::V3,
            permissions: None,
        }
    }

    /// A V2 record bound to a session-key-plugin grant.
    pub fn with_permissions(
        smart_account: Address,
        enable_signature: Bytes,
        session_key: SessionKey,
        permissions: SessionPermissions,
    ) -> Self {
        SessionRecord {
            smart_account,
            enable_signature,
            policies: Vec::new(),
            session_key,
            protocol: ProtocolVersion::V2,
            permissions: Some(permissions),
        }
    }

    /// The address that must be enabled on the account for this session.
    ///
    /// V2 sessions name their signer in the plugin grant; V3 sessions sign
    /// with the session key itself.
    pub fn expected_signer(&self) -> Option<Address> {
        match self.protocol {
            ProtocolVersion::V2 => self.permissions.as_ref().map(|p| p.signer),
            ProtocolVersion::V3 => Some(self.session_key.address()),
        }
    }

    /// Whether an enable signature was stored with the record.
    pub fn has_enable_signature(&self) -> bool {
        !self.enable_signature.is_empty()
    }
}

/// Policies are stored in their `{policyData, policyInfoBytes}` form and
/// rebuilt on read.
mod encoded_policies {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{EncodedPolicy, Policy};

    pub fn serialize<S: Serializer>(policies: &[Policy], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded: Vec<EncodedPolicy> = policies.iter().map(EncodedPolicy::from).collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Policy>, D::Error> {
        let encoded = Vec::<EncodedPolicy>::deserialize(deserializer)?;
        Ok(encoded.into_iter().map(Policy::from).collect())
    }
}

/// All persisted sessions keyed by identifier.
pub type SessionCollection = BTreeMap<PermissionId, SessionRecord>;

/// Pick the session to act with.
///
/// An explicit identifier wins and must name a session of `account`.
/// Without one, the account must have exactly one session.
pub fn resolve_session<'a>(
    session_id: Option<&PermissionId>,
    sessions: &'a SessionCollection,
    account: &Address,
) -> Result<(&'a PermissionId, &'a SessionRecord), SessionError> {
    if let Some(id) = session_id {
        let (id, record) = sessions
            .get_key_value(id)
            .ok_or_else(|| SessionError::SessionNotFound { id: id.clone() })?;
        if record.smart_account != *account {
            return Err(SessionError::SessionAccountMismatch {
                id: id.clone(),
                expected: *account,
                actual: record.smart_account,
            });
        }
        return Ok((id, record));
    }

    let mut owned = sessions
        .iter()
        .filter(|(_, record)| record.smart_account == *account);
    match (owned.next(), owned.next()) {
        (None, _) => Err(SessionError::NoSessionForAccount { account: *account }),
        (Some(only), None) => Ok(only),
        (Some(_), Some(_)) => Err(SessionError::SessionIdRequired {
            account: *account,
            count: 2 + owned.count(),
        }),
    }
}

/// Lifecycle position of a session as observed by a permission check.
///
/// `Expired` is only ever discovered reactively; there is no revocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Nothing is stored for the identifier
    Unknown,
    /// Not yet enabled on chain; the stored enable signature can activate it
    Activatable,
    /// Enabled on chain
    Enabled,
    /// No longer usable
    Expired,
}
