use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use gamehaul_protocol::{InstallInfo, OperationType, Runner, TaskParams};

use crate::error::RunnerError;

/// Outcome of a runner operation that ran to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The operation completed.
    Completed,
    /// The runner observed the abort flag (or its own cancel UI) and
    /// stopped early.
    Aborted,
}

/// Future type returned by runner operations.
pub type RunnerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RunnerError>> + Send + 'a>>;

/// Capability set implemented per acquisition backend.
///
/// The queue holds runners behind this trait and dispatches on the
/// `(runner, operation)` pair; implementations bridge to the actual
/// store SDK or download client. Long-running operations should poll
/// `abort` and return [`RunOutcome::Aborted`] when it trips; the queue
/// never cancels a task itself.
pub trait GameRunner: Send + Sync {
    /// Resolves manifest metadata for a game, if this backend has it.
    ///
    /// The default implementation reports no manifest support; only
    /// manifest-based runners override it. Callers treat `Ok(None)` and
    /// `Err` the same way; size display is best-effort.
    fn get_install_info<'a>(
        &'a self,
        app_name: &'a str,
        platform: &'a str,
    ) -> RunnerFuture<'a, Option<InstallInfo>> {
        let _ = (app_name, platform);
        Box::pin(async { Ok(None) })
    }

    /// Installs a game described by `params`.
    fn install<'a>(
        &'a self,
        app_name: &'a str,
        params: &'a TaskParams,
        abort: CancellationToken,
    ) -> RunnerFuture<'a, RunOutcome>;

    /// Updates an installed game described by `params`.
    fn update<'a>(
        &'a self,
        app_name: &'a str,
        params: &'a TaskParams,
        abort: CancellationToken,
    ) -> RunnerFuture<'a, RunOutcome>;

    /// Fetches a game directly from the backend's web delivery.
    fn download<'a>(
        &'a self,
        app_name: &'a str,
        abort: CancellationToken,
    ) -> RunnerFuture<'a, RunOutcome>;
}

/// Lookup table of registered runner implementations.
///
/// A runner missing from the table is an unsupported combination at
/// dispatch time; the queue records the task as failed instead of
/// calling anything.
#[derive(Clone, Default)]
pub struct RunnerSet {
    runners: HashMap<Runner, Arc<dyn GameRunner>>,
}

impl RunnerSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an implementation for `runner`, replacing any existing one.
    pub fn with_runner(mut self, runner: Runner, implementation: Arc<dyn GameRunner>) -> Self {
        self.runners.insert(runner, implementation);
        self
    }

    /// Returns the implementation registered for `runner`.
    pub fn get(&self, runner: Runner) -> Option<Arc<dyn GameRunner>> {
        self.runners.get(&runner).cloned()
    }
}

/// Concrete runner call selected for a `(runner, operation)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchTarget {
    Install,
    Update,
    Download,
}

/// Maps a `(runner, operation)` pair to the runner call that serves it.
///
/// Manifest-based runners install and update through their manifests;
/// the web runner serves every operation as a direct download. Unmapped
/// pairs return `None` so the caller can fail the task without invoking
/// any runner.
pub fn dispatch_target(runner: Runner, operation: OperationType) -> Option<DispatchTarget> {
    match (runner.is_manifest_based(), operation) {
        (true, OperationType::Install) => Some(DispatchTarget::Install),
        (true, OperationType::Update) => Some(DispatchTarget::Update),
        (true, OperationType::Download) => None,
        (false, _) => Some(DispatchTarget::Download),
    }
}
