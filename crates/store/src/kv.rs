use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Abstract key/value store the queue persists through.
///
/// Values are JSON; typed access goes through [`get_or`]. Implementations
/// must be safe to share across tasks; the queue serializes its own
/// read-modify-write sequences above this trait.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Stores `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is a no-op.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Returns `true` if `key` is present.
    fn has(&self, key: &str) -> Result<bool, StoreError>;
}

/// Reads `key` and deserializes it, returning `default` when absent.
pub fn get_or<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
    default: T,
) -> Result<T, StoreError> {
    match store.get(key)? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(default),
    }
}
