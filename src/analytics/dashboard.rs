//! Admin dashboard summary
//!
//! One pass over the activity records produces both the weekly series and
//! the per-action breakdown shown next to it.

use crate::activity::AsActivity;
use crate::analytics::weekly::{Attribution, DayCount, WeeklyActiveUsers};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;

/// Label for in-window events that carry no action
pub const UNKNOWN_ACTION: &str = "unknown";

/// Aggregate statistics for the admin dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Moment the window was computed for
    pub generated_at: DateTime<Utc>,
    /// Reporting zone
    pub timezone: String,
    /// First instant of the oldest day in the window, if representable
    pub window_start: Option<DateTime<Utc>>,
    /// Distinct users active today
    pub daily_active_users: usize,
    /// Distinct users active anywhere in the window
    pub weekly_active_users: usize,
    /// Events attributed to a day of the window
    pub events_in_window: usize,
    /// Daily series, oldest first
    pub series: Vec<DayCount>,
    /// Event counts per action inside the window
    pub actions: BTreeMap<String, usize>,
    /// Events skipped for a missing user id or timestamp
    pub skipped_malformed: usize,
}

impl DashboardStats {
    /// Build the summary for the window ending on `now`'s date
    pub fn build<I>(aggregator: &WeeklyActiveUsers, now: DateTime<Utc>, events: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsActivity,
    {
        let result: Result<Self, Infallible> =
            Self::try_build(aggregator, now, events.into_iter().map(Ok));
        match result {
            Ok(stats) => stats,
            Err(never) => match never {},
        }
    }

    /// Build the summary from a fallible stream, stopping at its first error
    pub fn try_build<I, A, E>(
        aggregator: &WeeklyActiveUsers,
        now: DateTime<Utc>,
        events: I,
    ) -> Result<Self, E>
    where
        I: IntoIterator<Item = Result<A, E>>,
        A: AsActivity,
    {
        let mut tally = aggregator.start(now);
        let mut actions: BTreeMap<String, usize> = BTreeMap::new();
        let mut events_in_window = 0;

        for event in events {
            let event = event?;
            if let Attribution::Counted(_) = tally.observe(&event) {
                events_in_window += 1;
                let action = event.action().unwrap_or(UNKNOWN_ACTION);
                *actions.entry(action.to_string()).or_insert(0) += 1;
            }
        }

        let window_start = tally
            .buckets()
            .first()
            .and_then(|bucket| aggregator.zone().start_of_day(bucket.date));
        let weekly = tally.finish();

        Ok(Self {
            generated_at: now,
            timezone: weekly.timezone,
            window_start,
            daily_active_users: weekly.today_count,
            weekly_active_users: weekly.weekly_unique_users,
            events_in_window,
            series: weekly.series,
            actions,
            skipped_malformed: weekly.skipped_malformed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityEvent, ActivityRecord};
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_dashboard_summary() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let events = vec![
            ActivityEvent::with_timestamp("a", at(10, 9)).action("view_idol"),
            ActivityEvent::with_timestamp("a", at(10, 10)).action("view_idol"),
            ActivityEvent::with_timestamp("b", at(10, 11)).action("comment"),
            ActivityEvent::with_timestamp("c", at(6, 8)),
            ActivityEvent::with_timestamp("d", at(1, 8)).action("favorite"),
        ];

        let stats = DashboardStats::build(&WeeklyActiveUsers::default(), now, &events);

        assert_eq!(stats.daily_active_users, 2);
        assert_eq!(stats.weekly_active_users, 3);
        assert_eq!(stats.events_in_window, 4);
        assert_eq!(stats.series.len(), 7);
        assert_eq!(stats.actions.get("view_idol"), Some(&2));
        assert_eq!(stats.actions.get("comment"), Some(&1));
        assert_eq!(stats.actions.get(UNKNOWN_ACTION), Some(&1));
        assert_eq!(stats.actions.get("favorite"), None);
        assert_eq!(
            stats.window_start,
            Some(Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_dashboard_counts_malformed() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let records = vec![ActivityRecord::default(), ActivityRecord::default()];

        let stats = DashboardStats::build(&WeeklyActiveUsers::default(), now, records);

        assert_eq!(stats.skipped_malformed, 2);
        assert_eq!(stats.events_in_window, 0);
        assert!(stats.actions.is_empty());
    }

    #[test]
    fn test_dashboard_propagates_stream_error() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let events: Vec<Result<ActivityEvent, &str>> = vec![
            Ok(ActivityEvent::with_timestamp("a", at(10, 9))),
            Err("disk gone"),
        ];

        let result = DashboardStats::try_build(&WeeklyActiveUsers::default(), now, events);
        assert_eq!(result, Err("disk gone"));
    }
}
