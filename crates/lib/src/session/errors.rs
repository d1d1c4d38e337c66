//! Session error types for the smart-session library.

use thiserror::Error;

use crate::policy::PermissionId;
use crate::primitives::Address;
use crate::provider::ProtocolVersion;

/// Errors raised while resolving, creating, or dispatching through sessions.
///
/// Absent or unreadable local state is not an error in this subsystem; it
/// resolves to `None` or to an expired check. These variants cover the cases
/// where a caller asked for something that cannot be satisfied.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No stored session belongs to the active account.
    #[error("No available session for account {account}")]
    NoSessionForAccount {
        /// The active smart account
        account: Address,
    },

    /// The account has several sessions and no identifier was given.
    #[error("Session id is required: account {account} has {count} sessions")]
    SessionIdRequired {
        /// The active smart account
        account: Address,
        /// Number of sessions stored for the account
        count: usize,
    },

    /// An explicitly requested session does not exist.
    #[error("Session not found: {id}")]
    SessionNotFound {
        /// The requested identifier
        id: PermissionId,
    },

    /// An explicitly requested session belongs to another account.
    #[error("Session {id} belongs to {actual}, not {expected}")]
    SessionAccountMismatch {
        /// The requested identifier
        id: PermissionId,
        /// The active smart account
        expected: Address,
        /// The account recorded on the session
        actual: Address,
    },

    /// The session was written for a different protocol version.
    #[error("Protocol mismatch: context uses {expected}, session uses {actual}")]
    ProtocolMismatch {
        /// Protocol of the connected account
        expected: ProtocolVersion,
        /// Protocol recorded on the session
        actual: ProtocolVersion,
    },

    /// The session is not enabled and carries no enable signature.
    #[error("Session expired: {id}")]
    SessionExpired {
        /// The expired session
        id: PermissionId,
    },

    /// A required argument was missing at an entry point.
    #[error("Missing required argument: {name}")]
    MissingArgument {
        /// Name of the missing argument
        name: &'static str,
    },

    /// The empty sentinel identifier was used as a storage key.
    #[error("The empty permission id cannot be used as a key")]
    EmptyPermissionId,

    /// A stored record is inconsistent with its protocol version.
    #[error("Invalid session record {id}: {reason}")]
    InvalidRecord {
        /// The identifier of the record
        id: PermissionId,
        /// Description of the inconsistency
        reason: String,
    },

    /// No unused session identifier could be drawn.
    #[error("Could not allocate a session id after {attempts} attempts")]
    IdentifierExhausted {
        /// Number of identifiers tried
        attempts: usize,
    },
}

impl SessionError {
    /// Check if this error indicates a session was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SessionError::NoSessionForAccount { .. } | SessionError::SessionNotFound { .. }
        )
    }

    /// Check if this error indicates the session can no longer be used.
    pub fn is_expired(&self) -> bool {
        matches!(self, SessionError::SessionExpired { .. })
    }

    /// Check if this error is a call-site bug rather than a runtime condition.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            SessionError::MissingArgument { .. } | SessionError::EmptyPermissionId
        )
    }

    /// Check if the caller must disambiguate between several sessions.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, SessionError::SessionIdRequired { .. })
    }

    /// Get the session identifier this error is about, if any.
    pub fn permission_id(&self) -> Option<&PermissionId> {
        match self {
            SessionError::SessionNotFound { id }
            | SessionError::SessionAccountMismatch { id, .. }
            | SessionError::SessionExpired { id }
            | SessionError::InvalidRecord { id, .. } => Some(id),
            _ => None,
        }
    }
}

// Conversion from SessionError to the main Error type
impl From<SessionError> for crate::Error {
    fn from(err: SessionError) -> Self {
        crate::Error::Session(err)
    }
}
