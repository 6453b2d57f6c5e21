fn main() {
    println!("Run `cargo test -p queue-flow` to execute queue end-to-end tests.");
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::sync::Semaphore;
    use tokio_util::sync::CancellationToken;

    use gamehaul_protocol::{
        DownloadTask, GameStatus, InstallInfo, ManagerState, OperationType, QueueEvent, Runner,
        TaskParams, TaskStatus,
    };
    use gamehaul_queue::DownloadManager;
    use gamehaul_runner::{GameRunner, RunOutcome, RunnerError, RunnerFuture, RunnerSet};
    use gamehaul_store::{JsonFileStore, KeyValueStore, MemoryStore};

    /// Runner fake shared by the end-to-end scenarios: per-app scripted
    /// failures, an optional gate holding operations until released, and
    /// a call log for ordering assertions.
    struct FakeRunner {
        failures: HashMap<String, String>,
        gate: Option<Arc<Semaphore>>,
        download_size: Option<u64>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn new() -> Self {
            Self {
                failures: HashMap::new(),
                gate: None,
                download_size: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(mut self, app_name: &str, message: &str) -> Self {
            self.failures.insert(app_name.into(), message.into());
            self
        }

        fn gated(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn with_size(mut self, bytes: u64) -> Self {
            self.download_size = Some(bytes);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn run(
            &self,
            op: &str,
            app_name: &str,
            abort: CancellationToken,
        ) -> Result<RunOutcome, RunnerError> {
            self.calls.lock().unwrap().push(format!("{op}:{app_name}"));
            if let Some(gate) = &self.gate {
                tokio::select! {
                    _ = abort.cancelled() => return Ok(RunOutcome::Aborted),
                    permit = gate.acquire() => permit.unwrap().forget(),
                }
            }
            match self.failures.get(app_name) {
                Some(message) => Err(RunnerError::Backend(message.clone())),
                None => Ok(RunOutcome::Completed),
            }
        }
    }

    impl GameRunner for FakeRunner {
        fn get_install_info<'a>(
            &'a self,
            _app_name: &'a str,
            _platform: &'a str,
        ) -> RunnerFuture<'a, Option<InstallInfo>> {
            Box::pin(async move {
                Ok(self.download_size.map(|download_size| InstallInfo {
                    manifest: gamehaul_protocol::DownloadManifest {
                        download_size,
                        disk_size: 0,
                    },
                }))
            })
        }

        fn install<'a>(
            &'a self,
            app_name: &'a str,
            _params: &'a TaskParams,
            abort: CancellationToken,
        ) -> RunnerFuture<'a, RunOutcome> {
            Box::pin(self.run("install", app_name, abort))
        }

        fn update<'a>(
            &'a self,
            app_name: &'a str,
            _params: &'a TaskParams,
            abort: CancellationToken,
        ) -> RunnerFuture<'a, RunOutcome> {
            Box::pin(self.run("update", app_name, abort))
        }

        fn download<'a>(
            &'a self,
            app_name: &'a str,
            abort: CancellationToken,
        ) -> RunnerFuture<'a, RunOutcome> {
            Box::pin(self.run("download", app_name, abort))
        }
    }

    fn task(app_name: &str, runner: Runner, operation: OperationType) -> DownloadTask {
        DownloadTask::new(
            app_name,
            runner,
            operation,
            TaskParams {
                platform: "linux".into(),
                install_path: format!("/games/{app_name}"),
                size: String::new(),
                extra: serde_json::Map::new(),
            },
        )
    }

    async fn wait_for_idle(manager: &DownloadManager) {
        for _ in 0..500 {
            if manager.state() == ManagerState::Idle
                && manager.queue_information().unwrap().pending.is_empty()
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("queue did not drain in time");
    }

    /// The canonical scenario: G1 (manifest install) fails, G2 (web
    /// download) succeeds, and the loop never stalls in between.
    #[tokio::test]
    async fn error_then_success_runs_to_completion() {
        let gate = Arc::new(Semaphore::new(0));
        let epic = Arc::new(
            FakeRunner::new()
                .failing("G1", "manifest fetch failed")
                .gated(gate.clone())
                .with_size(2_147_483_648),
        );
        let web = Arc::new(FakeRunner::new());
        let runners = RunnerSet::new()
            .with_runner(Runner::Epic, epic.clone())
            .with_runner(Runner::Web, web.clone());

        let manager = DownloadManager::new(Arc::new(MemoryStore::new()), runners);
        let mut events_rx = manager.take_events().unwrap();

        manager
            .enqueue(task("G1", Runner::Epic, OperationType::Install))
            .await
            .unwrap();
        manager
            .enqueue(task("G2", Runner::Web, OperationType::Download))
            .await
            .unwrap();

        let pending = manager.queue_information().unwrap().pending;
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].app_name, "G1");
        assert_eq!(pending[1].app_name, "G2");

        gate.add_permits(1);
        wait_for_idle(&manager).await;

        let info = manager.queue_information().unwrap();
        assert!(info.pending.is_empty());
        assert_eq!(info.state, ManagerState::Idle);
        assert_eq!(info.finished.len(), 2);
        assert_eq!(info.finished[0].app_name, "G1");
        assert_eq!(info.finished[0].status, Some(TaskStatus::Error));
        assert_eq!(info.finished[0].params.size, "2.00 GiB");
        assert_eq!(info.finished[1].app_name, "G2");
        assert_eq!(info.finished[1].status, Some(TaskStatus::Done));

        assert_eq!(epic.calls(), ["install:G1"]);
        assert_eq!(web.calls(), ["download:G2"]);

        // Observers saw the queue shrink: ... 2 -> 1 -> 0.
        let mut queue_lengths = Vec::new();
        while let Ok(event) = events_rx.try_recv() {
            if let QueueEvent::QueueChanged { queue } = event {
                queue_lengths.push(queue.len());
            }
        }
        assert!(queue_lengths.windows(2).any(|w| w[0] == 2 && w[1] == 1));
        assert_eq!(queue_lengths.last(), Some(&0));
    }

    #[tokio::test]
    async fn tasks_process_in_fifo_order() {
        let web = Arc::new(FakeRunner::new());
        let runners = RunnerSet::new().with_runner(Runner::Web, web.clone());
        let manager = DownloadManager::new(Arc::new(MemoryStore::new()), runners);

        for name in ["first", "second", "third"] {
            manager
                .enqueue(task(name, Runner::Web, OperationType::Download))
                .await
                .unwrap();
        }
        wait_for_idle(&manager).await;

        assert_eq!(
            web.calls(),
            ["download:first", "download:second", "download:third"]
        );
    }

    /// A queue persisted by one manager instance is visible to a fresh
    /// instance over the same store file.
    #[tokio::test]
    async fn pending_queue_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("downloads.json");

        let gate = Arc::new(Semaphore::new(0));
        let epic = Arc::new(FakeRunner::new().gated(gate));
        let runners = RunnerSet::new().with_runner(Runner::Epic, epic);

        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&path).unwrap());
        let manager = DownloadManager::new(store, runners);
        manager
            .enqueue(task("held", Runner::Epic, OperationType::Install))
            .await
            .unwrap();
        manager
            .enqueue(task("waiting", Runner::Epic, OperationType::Update))
            .await
            .unwrap();

        // A fresh store + manager over the same file sees both tasks.
        let reopened: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&path).unwrap());
        let fresh = DownloadManager::new(reopened, RunnerSet::new());
        let info = fresh.queue_information().unwrap();
        assert_eq!(info.pending.len(), 2);
        assert_eq!(info.pending[0].app_name, "held");
        assert_eq!(info.pending[1].app_name, "waiting");
        assert_eq!(info.state, ManagerState::Idle);
    }

    #[tokio::test]
    async fn finished_history_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("downloads.json");

        let web = Arc::new(FakeRunner::new());
        let runners = RunnerSet::new().with_runner(Runner::Web, web);
        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&path).unwrap());
        let manager = DownloadManager::new(store, runners);

        manager
            .enqueue(task("G1", Runner::Web, OperationType::Download))
            .await
            .unwrap();
        wait_for_idle(&manager).await;
        drop(manager);

        let reopened: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&path).unwrap());
        let fresh = DownloadManager::new(reopened, RunnerSet::new());
        let info = fresh.queue_information().unwrap();
        assert_eq!(info.finished.len(), 1);
        assert_eq!(info.finished[0].app_name, "G1");
        assert_eq!(info.finished[0].status, Some(TaskStatus::Done));
    }

    /// Removing a queued game notifies observers the way a completion
    /// does, so UIs drop it from the active list.
    #[tokio::test]
    async fn remove_notifies_like_completion() {
        let gate = Arc::new(Semaphore::new(0));
        let epic = Arc::new(FakeRunner::new().gated(gate.clone()));
        let runners = RunnerSet::new().with_runner(Runner::Epic, epic);
        let manager = DownloadManager::new(Arc::new(MemoryStore::new()), runners);
        let mut events_rx = manager.take_events().unwrap();

        manager
            .enqueue(task("held", Runner::Epic, OperationType::Install))
            .await
            .unwrap();
        manager
            .enqueue(task("doomed", Runner::Epic, OperationType::Install))
            .await
            .unwrap();
        manager.remove("doomed").await.unwrap();

        let mut saw_done = false;
        while let Ok(event) = events_rx.try_recv() {
            if let QueueEvent::GameStatusUpdate {
                app_name,
                status: GameStatus::Done,
                ..
            } = &event
            {
                assert_eq!(app_name, "doomed");
                saw_done = true;
            }
        }
        assert!(saw_done);

        gate.add_permits(1);
        wait_for_idle(&manager).await;
        let info = manager.queue_information().unwrap();
        assert_eq!(info.finished.len(), 1);
        assert_eq!(info.finished[0].app_name, "held");
    }
}
