//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::activity::{ActivityLog, ActivityResult, LogSnapshot};
use crate::analytics::WeeklyActiveUsers;
use crate::config::ApiConfig;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Append-only activity log
    pub activity_log: Arc<Mutex<ActivityLog>>,
    /// Weekly aggregator bound to the reporting zone
    pub aggregator: WeeklyActiveUsers,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(activity_log: ActivityLog, aggregator: WeeklyActiveUsers, config: ApiConfig) -> Self {
        Self {
            activity_log: Arc::new(Mutex::new(activity_log)),
            aggregator,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Capture the log's current extent; the lock is released before returning
    pub async fn log_snapshot(&self) -> ActivityResult<LogSnapshot> {
        let mut log = self.activity_log.lock().await;
        log.snapshot()
    }
}
