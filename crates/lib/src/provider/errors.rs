//! Error types for the account-abstraction collaborators.

use thiserror::Error;

/// Errors reported by an [`AccountProvider`](super::AccountProvider),
/// [`SmartAccount`](super::SmartAccount) or
/// [`OperationClient`](super::OperationClient).
///
/// The library never retries or rewrites these; they reach the caller as-is.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// The bundler or node refused the request.
    #[error("Request rejected: {reason}")]
    Rejected { reason: String },

    /// The request could not be delivered.
    #[error("Network error: {0}")]
    Network(String),

    /// A required service is not reachable or not configured.
    #[error("Service unavailable: {service}")]
    Unavailable { service: String },

    /// The collaborator returned data that could not be interpreted.
    #[error("Invalid response from {method}: {reason}")]
    InvalidResponse {
        method: &'static str,
        reason: String,
    },
}

impl ProviderError {
    /// Check if the remote side explicitly refused the request.
    pub fn is_rejected(&self) -> bool {
        matches!(self, ProviderError::Rejected { .. })
    }

    /// Check if this error is transport related.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            ProviderError::Network(_) | ProviderError::Unavailable { .. }
        )
    }
}

impl From<ProviderError> for crate::Error {
    fn from(err: ProviderError) -> Self {
        crate::Error::Provider(err)
    }
}
