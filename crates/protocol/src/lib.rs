//! Shared types for the Gamehaul acquisition backend.
//!
//! Everything that crosses a boundary lives here: queue elements, runner
//! and operation identities, terminal statuses, and the events the queue
//! pushes to observers. The queue core (`gamehaul-queue`), the runner
//! implementations, and any frontend bridge all speak these types.

pub mod events;
pub mod size;
pub mod types;

// Re-export primary types for convenience.
pub use events::QueueEvent;
pub use size::{UNKNOWN_SIZE, format_size};
pub use types::{
    DownloadManifest, DownloadTask, GameStatus, InstallInfo, ManagerState, OperationType,
    QueueSnapshot, Runner, TaskParams, TaskStatus,
};
