//! Permission identifiers: truncated fingerprints of policy sets.

use std::fmt;
use std::str::FromStr;

use alloy_sol_types::SolValue;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Policy, PolicyFlag};
use crate::constants::PERMISSION_ID_SIZE;
use crate::primitives::{Bytes, FixedBytes, FormatError, decode_hex, keccak256};

/// Identifier of a policy set, the join key between what was authorized and
/// what is stored.
///
/// Only [`PERMISSION_ID_SIZE`] bytes of the hash are kept, so distinct policy
/// sets can collide. The empty identifier (`0x`) stands for "no policies" and
/// is never used as a storage key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PermissionId(Option<FixedBytes<PERMISSION_ID_SIZE>>);

impl PermissionId {
    /// The empty sentinel identifier.
    pub const fn empty() -> Self {
        PermissionId(None)
    }

    /// Build an identifier from raw bytes.
    ///
    /// Accepts either the empty sentinel or exactly [`PERMISSION_ID_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.is_empty() {
            return Ok(PermissionId::empty());
        }
        let fixed: [u8; PERMISSION_ID_SIZE] =
            bytes.try_into().map_err(|_| FormatError::InvalidLength {
                what: "permission id",
                expected: PERMISSION_ID_SIZE,
                actual: bytes.len(),
            })?;
        Ok(PermissionId(Some(FixedBytes::from(fixed))))
    }

    /// Draw a random identifier.
    ///
    /// Used for sessions whose identity is not derived from a policy set.
    pub fn random() -> Self {
        let mut bytes = [0u8; PERMISSION_ID_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        PermissionId(Some(FixedBytes::from(bytes)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.0 {
            Some(bytes) => bytes.as_slice(),
            None => &[],
        }
    }
}

impl fmt::Display for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(bytes) => write!(f, "{bytes}"),
            None => f.write_str("0x"),
        }
    }
}

impl fmt::Debug for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionId({self})")
    }
}

impl FromStr for PermissionId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionId::from_slice(&decode_hex(s)?)
    }
}

/// Serialized as its hex text, which also makes it usable as a JSON map key.
impl Serialize for PermissionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PermissionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Compute the identifier of an ordered policy set.
///
/// Each policy contributes `info || data`; a trailing element holding the
/// for-all-validation flag is appended; the list is ABI-encoded as a single
/// `bytes[]`, hashed with Keccak-256, and truncated. `None` or an empty set
/// yields [`PermissionId::empty`].
pub fn compute_id(policies: Option<&[Policy]>) -> PermissionId {
    let policies = match policies {
        Some(policies) if !policies.is_empty() => policies,
        _ => return PermissionId::empty(),
    };

    let mut elements: Vec<Bytes> = policies
        .iter()
        .map(|policy| {
            [&policy.policy_info_bytes()[..], &policy.policy_data()[..]]
                .concat()
                .into()
        })
        .collect();
    elements.push(Bytes::copy_from_slice(
        &PolicyFlag::ForAllValidation.to_bytes(),
    ));

    let hash = keccak256(elements.abi_encode());
    PermissionId(Some(FixedBytes::from_slice(&hash[..PERMISSION_ID_SIZE])))
}
