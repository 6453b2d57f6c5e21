//! Persistence adapter over the store's `queue` and `finished` keys.

use std::sync::{Arc, Mutex};

use gamehaul_protocol::DownloadTask;
use gamehaul_store::{KeyValueStore, StoreError, get_or};

use crate::config::QueueConfig;

/// Owns every read and write of the queue's two store keys.
///
/// All access goes through one mutex so the processing loop and the
/// public `enqueue`/`remove` entry points never interleave a
/// read-modify-write sequence. The queue manager is the only writer of
/// these keys.
pub struct QueueState {
    store: Arc<dyn KeyValueStore>,
    queue_key: String,
    finished_key: String,
    lock: Mutex<()>,
}

impl QueueState {
    /// Creates an adapter over `store` using the keys from `config`.
    pub fn new(store: Arc<dyn KeyValueStore>, config: &QueueConfig) -> Self {
        Self {
            store,
            queue_key: config.queue_key.clone(),
            finished_key: config.finished_key.clone(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the pending queue in processing order.
    pub fn pending(&self) -> Result<Vec<DownloadTask>, StoreError> {
        let _guard = self.lock.lock().unwrap();
        self.read_pending()
    }

    /// Returns the current head of the pending queue.
    pub fn head(&self) -> Result<Option<DownloadTask>, StoreError> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.read_pending()?.into_iter().next())
    }

    /// Inserts `task` into the pending queue.
    ///
    /// If a task with the same `app_name` is already queued it is
    /// replaced at its current index; otherwise the task is appended.
    /// Returns the index the task landed at.
    pub fn upsert_pending(&self, task: &DownloadTask) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().unwrap();
        let mut queue = self.read_pending()?;
        let index = match queue.iter().position(|t| t.app_name == task.app_name) {
            Some(i) => {
                queue[i] = task.clone();
                i
            }
            None => {
                queue.push(task.clone());
                queue.len() - 1
            }
        };
        self.write_pending(&queue)?;
        Ok(index)
    }

    /// Persists mutated metadata for a task already in the pending queue.
    ///
    /// No-op if the task is no longer queued (removed concurrently).
    pub fn update_pending(&self, task: &DownloadTask) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap();
        let mut queue = self.read_pending()?;
        if let Some(i) = queue.iter().position(|t| t.app_name == task.app_name) {
            queue[i] = task.clone();
            self.write_pending(&queue)?;
        }
        Ok(())
    }

    /// Removes the pending task with `app_name`, returning it if present.
    ///
    /// Removing an absent name is a no-op.
    pub fn remove_pending(&self, app_name: &str) -> Result<Option<DownloadTask>, StoreError> {
        let _guard = self.lock.lock().unwrap();
        let mut queue = self.read_pending()?;
        let Some(i) = queue.iter().position(|t| t.app_name == app_name) else {
            return Ok(None);
        };
        let removed = queue.remove(i);
        self.write_pending(&queue)?;
        Ok(Some(removed))
    }

    /// Returns the finished history, most recent completion last.
    pub fn finished(&self) -> Result<Vec<DownloadTask>, StoreError> {
        let _guard = self.lock.lock().unwrap();
        self.read_finished()
    }

    /// Records a retired task in the finished history.
    ///
    /// The history holds at most one entry per `app_name`; an earlier
    /// entry for the same game is overwritten, not appended.
    pub fn record_finished(&self, task: &DownloadTask) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap();
        let mut finished = self.read_finished()?;
        finished.retain(|t| t.app_name != task.app_name);
        finished.push(task.clone());
        self.store.set(
            &self.finished_key,
            serde_json::to_value(&finished)?,
        )
    }

    fn read_pending(&self) -> Result<Vec<DownloadTask>, StoreError> {
        get_or(self.store.as_ref(), &self.queue_key, Vec::new())
    }

    fn write_pending(&self, queue: &[DownloadTask]) -> Result<(), StoreError> {
        self.store.set(&self.queue_key, serde_json::to_value(queue)?)
    }

    fn read_finished(&self) -> Result<Vec<DownloadTask>, StoreError> {
        get_or(self.store.as_ref(), &self.finished_key, Vec::new())
    }
}
