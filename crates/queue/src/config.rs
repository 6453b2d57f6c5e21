/// Tuning knobs for a download queue instance.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Store key holding the pending queue.
    pub queue_key: String,
    /// Store key holding the finished history.
    pub finished_key: String,
    /// Capacity of the observer event channel.
    pub event_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_key: "queue".into(),
            finished_key: "finished".into(),
            event_capacity: 256,
        }
    }
}
