//! # Idolboard
//!
//! Activity statistics backend for the idol and group database admin
//! dashboard.
//!
//! ## Features
//!
//! - **Weekly active users**: 7-day daily-active-user series in a configured
//!   reporting time zone
//! - **Dashboard summary**: DAU, weekly unique users, per-action breakdown
//! - **Append-only activity log**: JSON lines, tolerant replay
//! - **CSV import**: bulk-load activity exports
//!
//! ## Modules
//!
//! - [`activity`]: Activity events, the activity log, and CSV import
//! - [`analytics`]: Weekly aggregation and dashboard statistics
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use idolboard::activity::ActivityEvent;
//! use idolboard::analytics::WeeklyActiveUsers;
//!
//! let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
//! let at = |h| Utc.with_ymd_and_hms(2024, 3, 10, h, 0, 0).unwrap().timestamp_millis();
//!
//! let events = vec![
//!     ActivityEvent::with_timestamp("a", at(9)),
//!     ActivityEvent::with_timestamp("b", at(10)),
//!     ActivityEvent::with_timestamp("a", at(11)),
//! ];
//!
//! let weekly = WeeklyActiveUsers::default().aggregate(now, &events);
//! assert_eq!(weekly.today_count, 2);
//! ```

pub mod activity;
pub mod analytics;
pub mod api;
pub mod config;

// Re-export top-level types for convenience
pub use activity::{
    ActivityError, ActivityEvent, ActivityLog, ActivityRecord, ActivityResult, AsActivity,
    CsvImporter, LogSyncMode,
};

pub use analytics::{
    AnalyticsError, DashboardStats, DayBucket, DayCount, ReportingZone, WeeklyActiveUsers,
    WeeklyActivity, WINDOW_DAYS,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{
    AnalyticsConfig, ApiConfig, Config, ConfigError, LoggingConfig, StorageConfig,
};
