use serde::{Deserialize, Serialize};

use crate::types::{DownloadTask, GameStatus, Runner};

/// Notifications the queue pushes to observers.
///
/// Serialized with an `event` tag so frontend bridges can switch on the
/// event name without knowing the Rust enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum QueueEvent {
    /// A single game's queue status changed.
    GameStatusUpdate {
        app_name: String,
        runner: Runner,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        folder: Option<String>,
        status: GameStatus,
    },
    /// The pending queue's contents changed.
    ///
    /// Carries the full queue so observers see shrinkage as elements are
    /// retired and see in-place mutation of the head.
    QueueChanged { queue: Vec<DownloadTask> },
}
