//! Key-value storage for persisted session state.
//!
//! The session stores never reach for ambient global state; they are handed an
//! `Arc<dyn KeyValueStore>` at construction. [`InMemory`] is the volatile
//! implementation used in tests, [`FileStore`] keeps the same map in a JSON
//! file so sessions survive restarts.

mod errors;
mod file;
mod in_memory;

pub use errors::StorageError;
pub use file::FileStore;
pub use in_memory::InMemory;

use crate::Result;

/// A string-keyed store of JSON text values.
///
/// All implementations must be `Send` and `Sync`. Writes replace the whole
/// value for a key; there is no locking across a read-modify-write, so two
/// writers of the same key race with last-write-wins.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
