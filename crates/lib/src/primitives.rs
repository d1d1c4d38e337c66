//! Value types shared across the session subsystem.
//!
//! Chain values come from `alloy-primitives`; their serde form is the
//! `0x`-prefixed lowercase hex used when records are persisted as JSON.

use thiserror::Error as ThisError;

pub use alloy_primitives::{Address, B256, Bytes, FixedBytes, Selector, U256, keccak256};

/// Errors produced when parsing hex-encoded values.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum FormatError {
    /// The value was not valid hex.
    #[error("Invalid hex: {reason}")]
    InvalidHex {
        /// Description of the decoding failure
        reason: String,
    },

    /// The decoded value had the wrong number of bytes.
    #[error("Invalid length for {what}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// The kind of value being parsed
        what: &'static str,
        /// Expected byte length
        expected: usize,
        /// Actual byte length
        actual: usize,
    },

    /// The bytes do not form a valid secp256k1 secret key.
    #[error("Invalid secret key: {reason}")]
    InvalidSecretKey {
        /// Description of why the key was rejected
        reason: String,
    },
}

impl FormatError {
    /// Check if this error is a length mismatch.
    pub fn is_length_error(&self) -> bool {
        matches!(self, FormatError::InvalidLength { .. })
    }
}

/// Decode a hex string, with or without the `0x` prefix.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, FormatError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(digits).map_err(|e| FormatError::InvalidHex {
        reason: e.to_string(),
    })
}

/// Encode bytes as a lowercase `0x`-prefixed hex string.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode exactly `N` bytes of hex.
pub(crate) fn decode_fixed<const N: usize>(
    s: &str,
    what: &'static str,
) -> Result<[u8; N], FormatError> {
    let bytes = decode_hex(s)?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| FormatError::InvalidLength {
        what,
        expected: N,
        actual,
    })
}
