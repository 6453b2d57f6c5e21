//! Download manager: queue ownership and the processing loop.
//!
//! One instance owns the persisted queue. External callers `enqueue`,
//! `remove`, or read a snapshot; the processing loop is triggered by
//! `enqueue` when the manager is idle, retires one task at a time in
//! FIFO order, and exits when the queue drains.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use gamehaul_protocol::{
    DownloadTask, GameStatus, ManagerState, QueueEvent, QueueSnapshot, TaskStatus, UNKNOWN_SIZE,
    format_size,
};
use gamehaul_runner::{DispatchTarget, GameRunner, RunOutcome, RunnerSet, dispatch_target};
use gamehaul_store::KeyValueStore;

use crate::clock::{Clock, SystemClock};
use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::state::QueueState;

/// Single-consumer download/install/update queue.
///
/// Constructed with injected collaborators (store, runners, clock) so
/// multiple independent instances can exist and tests can wire fakes.
pub struct DownloadManager {
    inner: Arc<Inner>,
    events_rx: Mutex<Option<mpsc::Receiver<QueueEvent>>>,
}

struct Inner {
    state: QueueState,
    runners: RunnerSet,
    clock: Arc<dyn Clock>,
    events_tx: mpsc::Sender<QueueEvent>,
    manager_state: Mutex<ManagerState>,
    /// Abort flag for the task currently in flight, keyed by app name.
    active_abort: Mutex<Option<(String, CancellationToken)>>,
}

impl DownloadManager {
    /// Creates a manager with the default configuration and wall clock.
    pub fn new(store: Arc<dyn KeyValueStore>, runners: RunnerSet) -> Self {
        Self::with_config(store, runners, QueueConfig::default())
    }

    /// Creates a manager with an explicit configuration.
    pub fn with_config(
        store: Arc<dyn KeyValueStore>,
        runners: RunnerSet,
        config: QueueConfig,
    ) -> Self {
        Self::with_clock(store, runners, config, Arc::new(SystemClock))
    }

    /// Creates a manager with an explicit configuration and clock.
    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        runners: RunnerSet,
        config: QueueConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(config.event_capacity);
        Self {
            inner: Arc::new(Inner {
                state: QueueState::new(store, &config),
                runners,
                clock,
                events_tx,
                manager_state: Mutex::new(ManagerState::Idle),
                active_abort: Mutex::new(None),
            }),
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&self) -> Option<mpsc::Receiver<QueueEvent>> {
        self.events_rx.lock().unwrap().take()
    }

    /// Returns whether the processing loop is currently active.
    pub fn state(&self) -> ManagerState {
        *self.inner.manager_state.lock().unwrap()
    }

    /// Adds a task to the pending queue and starts processing if idle.
    ///
    /// A task whose `app_name` is already queued replaces the existing
    /// entry at its current position; otherwise the task is appended.
    /// Queue-owned metadata (`added_at`, timestamps, `status`) is reset
    /// regardless of what the caller supplied.
    pub async fn enqueue(&self, task: DownloadTask) -> Result<(), QueueError> {
        if task.app_name.trim().is_empty() {
            warn!(runner = %task.runner, "rejected enqueue: empty app name");
            return Err(QueueError::EmptyAppName);
        }

        let mut task = task;
        task.added_at = Some(self.inner.clock.now());
        task.start_time = None;
        task.end_time = None;
        task.status = None;

        let index = self.inner.state.upsert_pending(&task)?;
        debug!(
            app_name = %task.app_name,
            runner = %task.runner,
            operation = %task.operation,
            index,
            "task queued"
        );

        self.inner.emit_game_status(&task, GameStatus::Queued);
        self.inner.emit_queue_changed();

        self.maybe_start_loop();
        Ok(())
    }

    /// Removes the pending task with `app_name`, if any.
    ///
    /// Removing an absent name is a no-op. Finished history is never
    /// touched. If the named task is the one currently in flight, its
    /// abort flag is tripped; a runner that honors the flag reports the
    /// task as aborted.
    pub async fn remove(&self, app_name: &str) -> Result<(), QueueError> {
        {
            let active = self.inner.active_abort.lock().unwrap();
            if let Some((active_name, token)) = active.as_ref() {
                if active_name == app_name {
                    info!(app_name = %app_name, "abort requested for task in flight");
                    token.cancel();
                }
            }
        }

        let Some(removed) = self.inner.state.remove_pending(app_name)? else {
            return Ok(());
        };
        debug!(app_name = %app_name, "task removed from queue");

        self.inner.emit_game_status(&removed, GameStatus::Done);
        self.inner.emit_queue_changed();
        Ok(())
    }

    /// Returns a read-only snapshot of the pending queue and finished
    /// history. No side effects.
    pub fn queue_information(&self) -> Result<QueueSnapshot, QueueError> {
        Ok(QueueSnapshot {
            pending: self.inner.state.pending()?,
            finished: self.inner.state.finished()?,
            state: self.state(),
        })
    }

    /// Starts the processing loop unless one is already running.
    ///
    /// The idle check and the flip to running happen under one lock so
    /// two loops can never start concurrently.
    fn maybe_start_loop(&self) {
        let mut state = self.inner.manager_state.lock().unwrap();
        if *state == ManagerState::Running {
            return;
        }
        *state = ManagerState::Running;
        drop(state);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run_loop().await;
        });
    }
}

impl Inner {
    async fn run_loop(&self) {
        info!("download queue processing started");
        loop {
            // One queue read per iteration: the published snapshot and
            // the head both come from it, so observers see shrinkage and
            // head mutation exactly as the loop does.
            let queue = match self.state.pending() {
                Ok(q) => q,
                Err(e) => {
                    warn!(error = %e, "failed to read queue");
                    Vec::new()
                }
            };
            self.push_event(QueueEvent::QueueChanged { queue: queue.clone() });

            let Some(task) = queue.into_iter().next() else {
                // Re-check emptiness under the state flag: an enqueue
                // landing between the read above and this flip must
                // either be seen here or observe the idle state and
                // start a fresh loop.
                let mut flag = self.manager_state.lock().unwrap();
                let head = self.state.head().unwrap_or_else(|e| {
                    warn!(error = %e, "failed to re-read queue head");
                    None
                });
                if head.is_none() {
                    *flag = ManagerState::Idle;
                    info!("download queue drained, going idle");
                    return;
                }
                drop(flag);
                continue;
            };

            self.process_task(task).await;
        }
    }

    async fn process_task(&self, mut task: DownloadTask) {
        let app_name = task.app_name.clone();
        let runner_impl = self.runners.get(task.runner);

        // Size display is best-effort: any failure falls back to the
        // placeholder, never fails the task.
        if task.runner.is_manifest_based() {
            task.params.size = match &runner_impl {
                Some(runner) => {
                    match runner
                        .get_install_info(&app_name, &task.params.platform)
                        .await
                    {
                        Ok(Some(info)) => format_size(info.manifest.download_size),
                        Ok(None) => UNKNOWN_SIZE.to_string(),
                        Err(e) => {
                            warn!(app_name = %app_name, error = %e, "size lookup failed");
                            UNKNOWN_SIZE.to_string()
                        }
                    }
                }
                None => UNKNOWN_SIZE.to_string(),
            };
        }

        task.start_time = Some(self.clock.now());
        if let Err(e) = self.state.update_pending(&task) {
            warn!(app_name = %app_name, error = %e, "failed to persist task metadata");
        }

        let abort = CancellationToken::new();
        *self.active_abort.lock().unwrap() = Some((app_name.clone(), abort.clone()));

        info!(
            app_name = %app_name,
            runner = %task.runner,
            operation = %task.operation,
            "processing task"
        );
        let status = self.dispatch(&task, runner_impl, abort).await;

        self.active_abort.lock().unwrap().take();

        task.end_time = Some(self.clock.now());
        task.status = Some(status);

        match status {
            TaskStatus::Done => info!(app_name = %app_name, "task finished"),
            TaskStatus::Abort => info!(app_name = %app_name, "task aborted"),
            TaskStatus::Error => warn!(app_name = %app_name, "task failed"),
        }

        // A store failure past this point must not stall the queue: log
        // and advance with the in-memory copy.
        if let Err(e) = self.state.record_finished(&task) {
            warn!(app_name = %app_name, error = %e, "failed to record finished task");
        }
        // No-op if the task was already removed concurrently.
        if let Err(e) = self.state.remove_pending(&app_name) {
            warn!(app_name = %app_name, error = %e, "failed to remove task from queue");
        }
    }

    /// Runs the runner call selected for the task's `(runner, operation)`
    /// pair and converts every failure mode into a terminal status.
    async fn dispatch(
        &self,
        task: &DownloadTask,
        runner_impl: Option<Arc<dyn GameRunner>>,
        abort: CancellationToken,
    ) -> TaskStatus {
        let Some(target) = dispatch_target(task.runner, task.operation) else {
            error!(
                runner = %task.runner,
                operation = %task.operation,
                "unsupported runner/operation combination"
            );
            return TaskStatus::Error;
        };
        let Some(runner) = runner_impl else {
            error!(runner = %task.runner, "no implementation registered for runner");
            return TaskStatus::Error;
        };

        let result = match target {
            DispatchTarget::Install => runner.install(&task.app_name, &task.params, abort).await,
            DispatchTarget::Update => runner.update(&task.app_name, &task.params, abort).await,
            DispatchTarget::Download => runner.download(&task.app_name, abort).await,
        };

        match result {
            Ok(RunOutcome::Completed) => TaskStatus::Done,
            Ok(RunOutcome::Aborted) => TaskStatus::Abort,
            Err(e) => {
                error!(app_name = %task.app_name, error = %e, "runner operation failed");
                TaskStatus::Error
            }
        }
    }

    fn emit_game_status(&self, task: &DownloadTask, status: GameStatus) {
        let folder = if task.params.install_path.is_empty() {
            None
        } else {
            Some(task.params.install_path.clone())
        };
        self.push_event(QueueEvent::GameStatusUpdate {
            app_name: task.app_name.clone(),
            runner: task.runner,
            folder,
            status,
        });
    }

    fn emit_queue_changed(&self) {
        match self.state.pending() {
            Ok(queue) => self.push_event(QueueEvent::QueueChanged { queue }),
            Err(e) => warn!(error = %e, "failed to read queue for notification"),
        }
    }

    fn push_event(&self, event: QueueEvent) {
        // Fire-and-forget: a slow or absent observer must not stall the
        // queue.
        if let Err(e) = self.events_tx.try_send(event) {
            debug!(error = %e, "dropping queue event");
        }
    }
}
