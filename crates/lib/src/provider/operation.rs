//! Calls and user operations submitted through a session.

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::SessionValidator;
use crate::primitives::{Address, B256, Bytes, FixedBytes, keccak256};

/// Size of the nonce key in bytes (the upper 192 bits of an ERC-4337 nonce).
pub const NONCE_KEY_SIZE: usize = 24;

/// Hash identifying a submitted user operation.
pub type OperationHash = B256;

/// One contract call inside a user operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub to: Address,
    #[serde(default)]
    pub value: u128,
    #[serde(default)]
    pub data: Bytes,
}

impl Call {
    pub fn new(to: Address) -> Self {
        Call {
            to,
            value: 0,
            data: Bytes::default(),
        }
    }

    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }

    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }
}

/// Nonce key selecting an independent nonce lane on the account.
///
/// Operations on different lanes do not wait on each other, so concurrent
/// dispatches use distinct keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NonceKey(FixedBytes<NONCE_KEY_SIZE>);

impl NonceKey {
    pub const fn new(bytes: [u8; NONCE_KEY_SIZE]) -> Self {
        NonceKey(FixedBytes::new(bytes))
    }

    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        NonceKey::new(bytes)
    }

    /// Derive a key from a caller-chosen label.
    pub fn from_seed(seed: &str) -> Self {
        let hash = keccak256(seed.as_bytes());
        NonceKey(FixedBytes::from_slice(&hash[..NONCE_KEY_SIZE]))
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_KEY_SIZE] {
        &self.0.0
    }
}

impl fmt::Display for NonceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for NonceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NonceKey({self})")
    }
}

/// A user operation ready for the bundler client.
///
/// Gas fields, paymaster data and the final signature are the client's
/// concern; this carries what the session layer decides.
#[derive(Debug, Clone)]
pub struct UserOperation {
    /// The smart account executing the calls
    pub sender: Address,
    /// Account-specific encoding of the calls
    pub call_data: Bytes,
    /// Nonce lane; `None` lets the client use the default lane
    pub nonce_key: Option<NonceKey>,
    /// Session validator that signs the operation
    pub validator: SessionValidator,
}
