//! Disk-backed store: one JSON object per file.
//!
//! The whole map is loaded at open and rewritten on every mutation by
//! writing a temp file and renaming it over the target, so a crash
//! mid-write leaves the previous contents intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::warn;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// JSON-file-backed key/value store.
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl JsonFileStore {
    /// Opens the store at `path`, creating parent directories as needed.
    ///
    /// A missing file opens as an empty store. A corrupt file also opens
    /// as empty (with a warning): the queue must come back up after an
    /// interrupted write, and losing stale queue state is the cheaper
    /// failure.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "store file corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Returns the file this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &BTreeMap<String, serde_json::Value>) -> Result<(), StoreError> {
        let raw = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.data.read().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let mut data = self.data.write().unwrap();
        data.insert(key.to_string(), value);
        self.persist(&data)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut data = self.data.write().unwrap();
        if data.remove(key).is_some() {
            self.persist(&data)?;
        }
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.data.read().unwrap().contains_key(key))
    }
}
