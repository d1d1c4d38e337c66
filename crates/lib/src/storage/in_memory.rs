//! In-memory key-value store.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{KeyValueStore, StorageError};
use crate::Result;

/// A volatile store backed by a `BTreeMap`.
///
/// Suitable for tests and for hosts that persist state some other way.
#[derive(Debug, Default)]
pub struct InMemory {
    values: RwLock<BTreeMap<String, String>>,
}

impl InMemory {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemory {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| StorageError::LockPoisoned { store: "in-memory" })?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| StorageError::LockPoisoned { store: "in-memory" })?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| StorageError::LockPoisoned { store: "in-memory" })?;
        values.remove(key);
        Ok(())
    }
}
