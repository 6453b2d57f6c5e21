//! Persisted single-consumer queue for game acquisition work.
//!
//! This crate implements the download manager at the heart of Gamehaul:
//! a strict-FIFO queue of install/update/download tasks that survives
//! process restarts, runs at most one task at a time, and reports every
//! change to observers.
//!
//! # Shape
//!
//! - [`DownloadManager`] owns the queue. Callers only ever `enqueue`,
//!   `remove`, or read a snapshot; the processing loop is started by
//!   `enqueue` when the manager is idle and exits when the queue drains.
//! - [`QueueState`] is the persistence adapter: every read and write of
//!   the store's `queue` and `finished` keys goes through it.
//! - Collaborators are injected: the store ([`gamehaul_store`]), the
//!   runner implementations ([`gamehaul_runner::RunnerSet`]), and the
//!   clock ([`Clock`]), so tests run against fakes.
//!
//! A failed or aborted task never stops the loop: its status is
//! recorded in the finished history and the loop advances.

pub mod clock;
pub mod config;
pub mod error;
pub mod manager;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::QueueConfig;
pub use error::QueueError;
pub use manager::DownloadManager;
pub use state::QueueState;
