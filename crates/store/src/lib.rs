//! Durable key/value storage backing the download queue.
//!
//! The queue persists two logical keys, the pending queue and the
//! finished history, through the [`KeyValueStore`] trait. Production
//! code uses [`JsonFileStore`], one JSON object per file rewritten
//! atomically on every mutation; tests and ephemeral setups use
//! [`MemoryStore`].

pub mod error;
pub mod json_file;
pub mod kv;
pub mod memory;

pub use error::StoreError;
pub use json_file::JsonFileStore;
pub use kv::{KeyValueStore, get_or};
pub use memory::MemoryStore;
