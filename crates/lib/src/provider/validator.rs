//! Validator handles passed to the account provider.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{ENTRY_POINT_V06, ENTRY_POINT_V07};
use crate::crypto::SessionKey;
use crate::policy::{PermissionId, Policy};
use crate::primitives::{Address, Bytes};
use crate::session::{SessionPermissions, SessionRecord};

/// Smart-account protocol generation.
///
/// V2 accounts run against entry point v0.6 with the session-key plugin;
/// V3 accounts run against entry point v0.7 with the permission validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    V2,
    #[default]
    V3,
}

impl ProtocolVersion {
    pub fn entry_point(self) -> Address {
        match self {
            ProtocolVersion::V2 => ENTRY_POINT_V06,
            ProtocolVersion::V3 => ENTRY_POINT_V07,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::V2 => f.write_str("v2"),
            ProtocolVersion::V3 => f.write_str("v3"),
        }
    }
}

/// The owner's validator on the connected account.
///
/// An opaque handle as far as this library is concerned; the provider knows
/// how to sign with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SudoValidator {
    /// Validator contract installed on the account
    pub validator: Address,
    /// Owner address the validator checks signatures against
    pub owner: Address,
}

impl SudoValidator {
    pub fn new(validator: Address, owner: Address) -> Self {
        SudoValidator { validator, owner }
    }
}

/// A session-scoped validator: a session key plus what it may do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionValidator {
    protocol: ProtocolVersion,
    permission_id: PermissionId,
    session_key: SessionKey,
    policies: Vec<Policy>,
    permissions: Option<SessionPermissions>,
    enable_signature: Option<Bytes>,
}

impl SessionValidator {
    /// A V3 validator for a policy set.
    pub fn with_policies(
        permission_id: PermissionId,
        session_key: SessionKey,
        policies: Vec<Policy>,
    ) -> Self {
        SessionValidator {
            protocol: ProtocolVersion::V3,
            permission_id,
            session_key,
            policies,
            permissions: None,
            enable_signature: None,
        }
    }

    /// A V2 validator for a session-key-plugin grant.
    pub fn with_permissions(
        permission_id: PermissionId,
        session_key: SessionKey,
        permissions: SessionPermissions,
    ) -> Self {
        SessionValidator {
            protocol: ProtocolVersion::V2,
            permission_id,
            session_key,
            policies: Vec::new(),
            permissions: Some(permissions),
            enable_signature: None,
        }
    }

    /// Rebuild the validator for a key held in the local key store.
    ///
    /// `None` when the stored state cannot back a `protocol` validator: the
    /// record was written for another protocol, a V2 session has no grant, or
    /// the key does not belong to the session signer. Without a record only a
    /// V3 session can be rebuilt, signed by the key itself.
    pub(crate) fn from_stored(
        protocol: ProtocolVersion,
        permission_id: &PermissionId,
        key: SessionKey,
        policies: Vec<Policy>,
        record: Option<&SessionRecord>,
    ) -> Option<Self> {
        if let Some(record) = record.filter(|r| r.protocol != protocol) {
            tracing::debug!(
                permission_id = %permission_id,
                expected = %protocol,
                actual = %record.protocol,
                "Session written for another protocol"
            );
            return None;
        }

        let expected_signer = match record {
            Some(record) => record.expected_signer()?,
            None if protocol == ProtocolVersion::V3 => key.address(),
            None => return None,
        };
        if key.address() != expected_signer {
            tracing::warn!(
                permission_id = %permission_id,
                expected = %expected_signer,
                actual = %key.address(),
                "Stored session key does not match the session signer"
            );
            return None;
        }

        let validator = match protocol {
            ProtocolVersion::V3 => Self::with_policies(permission_id.clone(), key, policies),
            ProtocolVersion::V2 => Self::with_permissions(
                permission_id.clone(),
                key,
                record?.permissions.clone()?,
            ),
        };
        Some(match record {
            Some(record) if record.has_enable_signature() => {
                validator.with_enable_signature(record.enable_signature.clone())
            }
            _ => validator,
        })
    }

    /// Attach the owner's signature that installs this validator on first use.
    pub fn with_enable_signature(mut self, signature: Bytes) -> Self {
        self.enable_signature = Some(signature);
        self
    }

    pub fn without_enable_signature(mut self) -> Self {
        self.enable_signature = None;
        self
    }

    pub fn protocol(&self) -> ProtocolVersion {
        self.protocol
    }

    pub fn permission_id(&self) -> &PermissionId {
        &self.permission_id
    }

    pub fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn permissions(&self) -> Option<&SessionPermissions> {
        self.permissions.as_ref()
    }

    pub fn enable_signature(&self) -> Option<&Bytes> {
        self.enable_signature.as_ref()
    }

    /// The address the account checks this validator against.
    pub fn signer(&self) -> Address {
        match (&self.protocol, &self.permissions) {
            (ProtocolVersion::V2, Some(permissions)) => permissions.signer,
            _ => self.session_key.address(),
        }
    }
}
