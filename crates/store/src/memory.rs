use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// In-memory store. Contents do not survive the process; used by tests
/// and by setups that opt out of persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.data.read().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.data.write().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.data.write().unwrap().remove(key);
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.data.read().unwrap().contains_key(key))
    }
}
