//! Storage error types for the smart-session key-value layer.

use thiserror::Error;

/// Errors that can occur while reading or writing the key-value store.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StorageError {
    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("Storage lock poisoned: {store}")]
    LockPoisoned {
        /// The store whose lock was poisoned
        store: &'static str,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization of a backing file failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Check if this error is related to I/O operations.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            StorageError::FileIo { .. }
                | StorageError::SerializationFailed { .. }
                | StorageError::DeserializationFailed { .. }
        )
    }

    /// Check if this error indicates a poisoned lock.
    pub fn is_poisoned(&self) -> bool {
        matches!(self, StorageError::LockPoisoned { .. })
    }
}

// Conversion from StorageError to the main Error type
impl From<StorageError> for crate::Error {
    fn from(err: StorageError) -> Self {
        crate::Error::Storage(err)
    }
}
