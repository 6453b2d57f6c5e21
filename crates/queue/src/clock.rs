//! Injected time source for task timestamps.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// Time source the queue stamps `start_time`/`end_time` with.
///
/// Injected so tests run against a deterministic clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock that advances one second per reading.
///
/// Successive `now()` calls return strictly increasing timestamps, so
/// tests can assert ordering of queue-stamped times exactly.
#[derive(Debug)]
pub struct ManualClock {
    epoch: DateTime<Utc>,
    ticks: AtomicI64,
}

impl ManualClock {
    /// Creates a clock starting at `epoch`.
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            epoch,
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.epoch + Duration::seconds(tick)
    }
}
