//!
//! smart-session: scoped session keys for ERC-4337 smart accounts.
//!
//! A session key is a locally generated signing key that the account owner
//! authorizes once, under a set of policies, so that later operations can be
//! signed without prompting the owner again.
//!
//! ## Core Concepts
//!
//! * **Policies (`policy::Policy`)**: Immutable authorization rules. An ordered policy set hashes to a
//!   two-byte **permission id** (`policy::PermissionId`) that keys everything else.
//! * **Session stores (`session::SessionKeyStore`, `session::SessionStore`)**: The secret key and the
//!   authorization record for each permission id, persisted as JSON in an injected key-value store
//!   (`storage::KeyValueStore`).
//! * **Collaborators (`provider::AccountProvider`, `provider::SmartAccount`, `provider::OperationClient`)**:
//!   The account-abstraction SDK the host application connects. The library never talks to a chain directly.
//! * **Permission validator (`permission::PermissionValidator`)**: Answers whether a session is currently
//!   enabled on the account.
//! * **Dispatcher (`dispatch::SessionDispatcher`)**: Sends calls signed by a stored session.
//! * **Manager (`SessionManager`)**: Owns the stores, creates sessions, and only hands out a validator or
//!   dispatcher once the wallet context has everything they need.

pub mod config;
pub mod constants;
pub mod crypto;
pub mod dispatch;
pub mod manager;
pub mod permission;
pub mod policy;
pub mod primitives;
pub mod provider;
pub mod session;
pub mod storage;

pub use config::SessionConfig;
pub use manager::{CreatedSession, SessionGrant, SessionManager};

/// Result type used throughout the smart-session library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the smart-session library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Malformed hex, lengths or keys from the primitives module
    #[error(transparent)]
    Format(primitives::FormatError),

    /// Structured storage errors from the storage module
    #[error(transparent)]
    Storage(storage::StorageError),

    /// Structured session errors from the session module
    #[error(transparent)]
    Session(session::SessionError),

    /// Errors reported by the account-abstraction collaborators
    #[error(transparent)]
    Provider(provider::ProviderError),
}

impl From<primitives::FormatError> for Error {
    fn from(err: primitives::FormatError) -> Self {
        Error::Format(err)
    }
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Format(_) => "primitives",
            Error::Storage(_) => "storage",
            Error::Session(_) => "session",
            Error::Provider(_) => "provider",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a session was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Session(session_err) => session_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates the session can no longer be used.
    pub fn is_expired(&self) -> bool {
        match self {
            Error::Session(session_err) => session_err.is_expired(),
            _ => false,
        }
    }

    /// Check if the caller must pick one of several sessions.
    pub fn is_ambiguous(&self) -> bool {
        match self {
            Error::Session(session_err) => session_err.is_ambiguous(),
            _ => false,
        }
    }

    /// Check if this error is a call-site bug rather than a runtime condition.
    pub fn is_programmer_error(&self) -> bool {
        match self {
            Error::Session(session_err) => session_err.is_programmer_error(),
            _ => false,
        }
    }

    /// Check if this error came from submitting or preparing an operation.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Error::Provider(_))
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Storage(storage_err) => storage_err.is_io_error(),
            _ => false,
        }
    }

    /// Check if this error indicates malformed input data.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Error::Format(_))
    }
}
