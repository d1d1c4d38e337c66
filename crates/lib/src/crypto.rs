//! Hashing and session-key cryptography.
//!
//! Session keys are secp256k1 keys whose account address is the last 20 bytes
//! of the Keccak-256 hash of the uncompressed public key. That address is what
//! the permission checks compare against, so the derivation lives here rather
//! than behind the account-abstraction SDK.

use std::fmt;
use std::str::FromStr;

use libsecp256k1::{PublicKey, SecretKey};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::primitives::{Address, FormatError, Selector, decode_hex, encode_hex, keccak256};

/// Size of secp256k1 secret keys in bytes
pub const SECRET_KEY_SIZE: usize = 32;

/// Function selector for a canonical signature such as `"mint(address)"`.
pub fn selector(signature: &str) -> Selector {
    Selector::from_slice(&keccak256(signature.as_bytes())[..4])
}

fn address_of(public: &PublicKey) -> Address {
    let uncompressed = public.serialize();
    Address::from_word(keccak256(&uncompressed[1..]))
}

/// A locally generated session signing key.
///
/// Never derived from the primary wallet key. The raw secret is held in a
/// [`Zeroizing`] buffer and cleared when the key is dropped; `Debug` output is
/// redacted.
#[derive(Clone)]
pub struct SessionKey {
    secret: Zeroizing<[u8; SECRET_KEY_SIZE]>,
    address: Address,
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey({}, [REDACTED])", self.address)
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        *self.secret == *other.secret
    }
}

impl Eq for SessionKey {}

impl SessionKey {
    /// Generate a new random key from the OS RNG.
    pub fn generate() -> Self {
        loop {
            let mut candidate = Zeroizing::new([0u8; SECRET_KEY_SIZE]);
            OsRng.fill_bytes(&mut *candidate);
            // Out-of-range scalars are rejected by parse; just draw again.
            if let Ok(key) = Self::from_bytes(&candidate) {
                return key;
            }
        }
    }

    /// Reconstruct a key from its raw 32 bytes.
    pub fn from_bytes(bytes: &[u8; SECRET_KEY_SIZE]) -> Result<Self, FormatError> {
        let secret = SecretKey::parse(bytes).map_err(|e| FormatError::InvalidSecretKey {
            reason: format!("{e:?}"),
        })?;
        let address = address_of(&PublicKey::from_secret_key(&secret));
        Ok(SessionKey {
            secret: Zeroizing::new(*bytes),
            address,
        })
    }

    /// The account address controlled by this key.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Export the key as `0x`-prefixed hex.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(encode_hex(&self.secret[..]))
    }
}

impl FromStr for SessionKey {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = Zeroizing::new(decode_hex(s)?);
        let array: [u8; SECRET_KEY_SIZE] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| FormatError::InvalidLength {
                    what: "session key",
                    expected: SECRET_KEY_SIZE,
                    actual: bytes.len(),
                })?;
        let array = Zeroizing::new(array);
        SessionKey::from_bytes(&array)
    }
}

/// Serializes as `0x`-prefixed hex, the form used in local storage.
impl Serialize for SessionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SessionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = Zeroizing::new(String::deserialize(deserializer)?);
        s.parse().map_err(serde::de::Error::custom)
    }
}
