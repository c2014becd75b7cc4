//! Dashboard Analytics
//!
//! Aggregations over the activity log:
//!
//! - **zone**: Reporting time zone and calendar helpers
//! - **weekly**: 7-day daily-active-user series
//! - **dashboard**: Admin dashboard summary built on the weekly tally
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust
//! use idolboard::activity::ActivityEvent;
//! use idolboard::analytics::{ReportingZone, WeeklyActiveUsers};
//!
//! let aggregator = WeeklyActiveUsers::new(ReportingZone::parse("Asia/Seoul").unwrap());
//! let events = vec![ActivityEvent::new("user-1"), ActivityEvent::new("user-2")];
//!
//! let weekly = aggregator.aggregate(chrono::Utc::now(), &events);
//! assert_eq!(weekly.series.len(), 7);
//! assert_eq!(weekly.today_count, 2);
//! ```

pub mod dashboard;
pub mod error;
pub mod weekly;
pub mod zone;

pub use dashboard::{DashboardStats, UNKNOWN_ACTION};
pub use error::{AnalyticsError, AnalyticsResult};
pub use weekly::{
    Attribution, DayBucket, DayCount, WeekTally, WeeklyActiveUsers, WeeklyActivity, WINDOW_DAYS,
};
pub use zone::{short_weekday, window_ending, ReportingZone};
