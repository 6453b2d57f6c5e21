use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend integration target a game is acquired through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runner {
    /// Epic Games Store, installed from its distribution manifest.
    Epic,
    /// GOG, installed from its distribution manifest.
    Gog,
    /// Direct web delivery (no manifest, download only).
    Web,
}

impl Runner {
    /// Returns `true` for runners that install from a store manifest
    /// and can therefore report a download size up front.
    pub fn is_manifest_based(self) -> bool {
        matches!(self, Runner::Epic | Runner::Gog)
    }

    /// Returns the lowercase wire name of the runner.
    pub fn as_str(self) -> &'static str {
        match self {
            Runner::Epic => "epic",
            Runner::Gog => "gog",
            Runner::Web => "web",
        }
    }
}

impl std::fmt::Display for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of work a queue element performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Install,
    Update,
    Download,
}

impl OperationType {
    /// Returns the lowercase wire name of the operation.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Install => "install",
            OperationType::Update => "update",
            OperationType::Download => "download",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of a retired task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Done,
    Error,
    Abort,
}

/// Per-game status carried by [`QueueEvent::GameStatusUpdate`].
///
/// `Queued` when a task enters the queue, `Done` when it leaves the
/// active queue (retired by the loop or removed by the caller).
///
/// [`QueueEvent::GameStatusUpdate`]: crate::events::QueueEvent::GameStatusUpdate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Queued,
    Done,
}

/// Whether the queue's processing loop is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerState {
    Idle,
    Running,
}

/// Operation payload carried by a task.
///
/// `size` is mutable metadata the queue fills in while processing; the
/// flattened `extra` map carries runner-specific fields the core passes
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskParams {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub platform: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub install_path: String,
    /// Human-readable download size estimate ("1.40 GiB").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub size: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One unit of acquisition work, tracked queued -> processing -> finished.
///
/// `added_at`, `start_time`, `end_time`, and `status` are set by the
/// queue, never by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadTask {
    pub app_name: String,
    pub runner: Runner,
    pub operation: OperationType,
    #[serde(default)]
    pub params: TaskParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Present only once the task has been retired to history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl DownloadTask {
    /// Creates a fresh task with no queue-owned metadata set.
    pub fn new(
        app_name: impl Into<String>,
        runner: Runner,
        operation: OperationType,
        params: TaskParams,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            runner,
            operation,
            params,
            added_at: None,
            start_time: None,
            end_time: None,
            status: None,
        }
    }
}

/// Manifest metadata reported by a manifest-based runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadManifest {
    pub download_size: u64,
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub disk_size: u64,
}

fn is_zero_u64(v: &u64) -> bool {
    *v == 0
}

/// Result of a runner's install-info lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallInfo {
    pub manifest: DownloadManifest,
}

/// Read-only snapshot of the queue returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub pending: Vec<DownloadTask>,
    pub finished: Vec<DownloadTask>,
    pub state: ManagerState,
}
