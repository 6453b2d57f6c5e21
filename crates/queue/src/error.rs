//! Queue error types.

/// Errors surfaced by the queue's public entry points.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("task has no app name")]
    EmptyAppName,

    #[error("store error: {0}")]
    Store(#[from] gamehaul_store::StoreError),
}
