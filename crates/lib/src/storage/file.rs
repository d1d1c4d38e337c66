//! Key-value store persisted to a JSON file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::{KeyValueStore, StorageError};
use crate::Result;

/// The current file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

#[derive(Serialize, Deserialize, Default)]
struct SerializableStore {
    /// File format version for compatibility checking
    #[serde(rename = "_v", default, skip_serializing_if = "is_v0")]
    version: u8,
    #[serde(default)]
    values: BTreeMap<String, String>,
}

/// A durable store that mirrors its map into a JSON file.
///
/// Every mutation rewrites the whole file, matching the read-all/write-all
/// access pattern of the session stores. Reads are served from memory.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// If the file does not exist, an empty store is returned and the file is
    /// created on the first write.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(text) => {
                let stored: SerializableStore = serde_json::from_str(&text)
                    .map_err(|source| StorageError::DeserializationFailed { source })?;
                if stored.version != PERSISTENCE_VERSION {
                    tracing::warn!(
                        path = %path.display(),
                        version = stored.version,
                        "Unknown store file version, reading values as-is"
                    );
                }
                stored.values
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::FileIo { source }.into()),
        };
        tracing::debug!(path = %path.display(), keys = values.len(), "Opened file store");
        Ok(FileStore {
            path,
            values: RwLock::new(values),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let stored = SerializableStore {
            version: PERSISTENCE_VERSION,
            values: values.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|source| StorageError::SerializationFailed { source })?;
        fs::write(&self.path, json).map_err(|source| StorageError::FileIo { source })?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| StorageError::LockPoisoned { store: "file" })?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| StorageError::LockPoisoned { store: "file" })?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| StorageError::LockPoisoned { store: "file" })?;
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}
