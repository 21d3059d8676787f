//! Idle-shutdown monitoring.
//!
//! The bot is meant to run on borrowed GPU time; when nothing has happened
//! for the configured window and the queue is drained, the process shuts
//! down. Submissions and completed jobs touch the shared activity tracker.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use super::queue::JobQueue;

const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Mutation-guarded last-activity instant shared by submission handlers
/// and the worker.
pub struct ActivityTracker {
    last: Mutex<Instant>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(Instant::now()),
        }
    }

    /// Record activity now
    pub fn touch(&self) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        *last = Instant::now();
    }

    /// Time since the last recorded activity
    pub fn idle_for(&self) -> Duration {
        let last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        last.elapsed()
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// True once the idle window has been exhausted
pub fn should_shutdown(idle_for: Duration, idle_limit: Duration) -> bool {
    idle_for >= idle_limit
}

/// Resolve once the queue is empty and the idle limit is exceeded.
///
/// Polls every 30 seconds. The caller races this against the shutdown
/// signal and cancels the worker when either fires.
pub async fn idle_monitor(queue: JobQueue, activity: std::sync::Arc<ActivityTracker>, idle_limit: Duration) {
    loop {
        tokio::time::sleep(POLL_INTERVAL).await;
        let idle_for = activity.idle_for();
        debug!(idle_secs = idle_for.as_secs(), pending = queue.len(), "Idle check");
        if queue.is_empty() && should_shutdown(idle_for, idle_limit) {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_shutdown_boundary() {
        let limit = Duration::from_secs(300);
        assert!(!should_shutdown(Duration::from_secs(299), limit));
        assert!(should_shutdown(Duration::from_secs(300), limit));
        assert!(should_shutdown(Duration::from_secs(301), limit));
    }

    #[test]
    fn test_touch_resets_idle_time() {
        let tracker = ActivityTracker::new();
        std::thread::sleep(Duration::from_millis(20));
        assert!(tracker.idle_for() >= Duration::from_millis(20));

        tracker.touch();
        assert!(tracker.idle_for() < Duration::from_millis(20));
    }
}
