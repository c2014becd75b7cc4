//! Weekly active-user aggregation
//!
//! Turns a flat list of activity events into the 7-day daily-active-user
//! series shown on the admin dashboard.
//!
//! ```text
//! events → calendar date (reporting zone) → day bucket → distinct users → series
//! ```
//!
//! Events that fall outside the window (too old, or in the future because of
//! clock skew) are dropped. Events without a user id or a usable timestamp
//! are skipped. Neither is an error.

use crate::activity::AsActivity;
use crate::analytics::zone::{short_weekday, window_ending, ReportingZone};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::convert::Infallible;

/// Number of calendar days in the window, today included
pub const WINDOW_DAYS: usize = 7;

/// Per-day accumulator of distinct user ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBucket {
    /// Calendar date in the reporting zone
    pub date: NaiveDate,
    /// Short weekday name
    pub label: String,
    /// Users with at least one event on this date
    pub users: HashSet<String>,
}

impl DayBucket {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            label: short_weekday(date),
            users: HashSet::new(),
        }
    }

    fn to_count(&self) -> DayCount {
        DayCount {
            date: self.date,
            label: self.label.clone(),
            count: self.users.len(),
        }
    }
}

/// One point of the weekly series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    /// Calendar date (serialized as YYYY-MM-DD)
    pub date: NaiveDate,
    /// Short weekday name
    pub label: String,
    /// Distinct users active on this date
    pub count: usize,
}

/// Output of one aggregation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyActivity {
    /// Reporting zone the dates were derived in
    pub timezone: String,
    /// Exactly `WINDOW_DAYS` points, oldest first, ending today
    pub series: Vec<DayCount>,
    /// Distinct users active today (last point of the series)
    pub today_count: usize,
    /// Distinct users active anywhere in the window
    pub weekly_unique_users: usize,
    /// Events skipped for a missing user id or timestamp
    pub skipped_malformed: usize,
    /// Well-formed events that fell outside the window
    pub outside_window: usize,
}

/// Where a single event ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribution {
    /// Counted in the bucket at this index of the series
    Counted(usize),
    /// Dated before the window or after today
    OutsideWindow,
    /// Missing user id or unusable timestamp
    Malformed,
}

/// In-progress aggregation over one window
///
/// Obtained from [`WeeklyActiveUsers::start`]; feed events with
/// [`WeekTally::observe`] and close with [`WeekTally::finish`].
#[derive(Debug, Clone)]
pub struct WeekTally {
    zone: ReportingZone,
    buckets: Vec<DayBucket>,
    skipped_malformed: usize,
    outside_window: usize,
}

impl WeekTally {
    /// Attribute one event to its bucket
    pub fn observe<A: AsActivity>(&mut self, event: &A) -> Attribution {
        let (Some(user_id), Some(at)) = (event.user_id(), event.occurred_at()) else {
            self.skipped_malformed += 1;
            return Attribution::Malformed;
        };

        match self.bucket_index(self.zone.date_of(at)) {
            Some(idx) => {
                self.buckets[idx].users.insert(user_id.to_string());
                Attribution::Counted(idx)
            }
            None => {
                self.outside_window += 1;
                Attribution::OutsideWindow
            }
        }
    }

    /// Buckets built so far
    pub fn buckets(&self) -> &[DayBucket] {
        &self.buckets
    }

    /// Close the tally and produce the series
    pub fn finish(self) -> WeeklyActivity {
        let series: Vec<DayCount> = self.buckets.iter().map(DayBucket::to_count).collect();
        let today_count = series.last().map(|day| day.count).unwrap_or(0);
        let weekly_unique_users = self
            .buckets
            .iter()
            .flat_map(|bucket| bucket.users.iter())
            .collect::<HashSet<_>>()
            .len();

        WeeklyActivity {
            timezone: self.zone.to_string(),
            series,
            today_count,
            weekly_unique_users,
            skipped_malformed: self.skipped_malformed,
            outside_window: self.outside_window,
        }
    }

    fn bucket_index(&self, date: NaiveDate) -> Option<usize> {
        let first = self.buckets.first()?.date;
        let offset = usize::try_from((date - first).num_days()).ok()?;
        (offset < self.buckets.len()).then_some(offset)
    }
}

/// Weekly active-user aggregator
///
/// Stateless apart from its reporting zone: every call builds fresh buckets,
/// so the same `(now, events)` always yields the same result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeeklyActiveUsers {
    zone: ReportingZone,
}

impl WeeklyActiveUsers {
    pub fn new(zone: ReportingZone) -> Self {
        Self { zone }
    }

    /// Reporting zone used for calendar dates
    pub fn zone(&self) -> ReportingZone {
        self.zone
    }

    /// Empty buckets for the window ending on `now`'s date
    pub fn buckets(&self, now: DateTime<Utc>) -> Vec<DayBucket> {
        window_ending(self.zone.date_of(now), WINDOW_DAYS)
            .into_iter()
            .map(DayBucket::new)
            .collect()
    }

    /// Start an incremental tally for the window ending on `now`'s date
    pub fn start(&self, now: DateTime<Utc>) -> WeekTally {
        WeekTally {
            zone: self.zone,
            buckets: self.buckets(now),
            skipped_malformed: 0,
            outside_window: 0,
        }
    }

    /// Aggregate a fully materialized collection of events
    pub fn aggregate<I>(&self, now: DateTime<Utc>, events: I) -> WeeklyActivity
    where
        I: IntoIterator,
        I::Item: AsActivity,
    {
        let result: Result<WeeklyActivity, Infallible> =
            self.try_aggregate(now, events.into_iter().map(Ok));
        match result {
            Ok(weekly) => weekly,
            Err(never) => match never {},
        }
    }

    /// Aggregate a fallible stream of events
    ///
    /// The first error from the stream is returned unchanged; malformed
    /// events are still skipped, not reported.
    pub fn try_aggregate<I, A, E>(&self, now: DateTime<Utc>, events: I) -> Result<WeeklyActivity, E>
    where
        I: IntoIterator<Item = Result<A, E>>,
        A: AsActivity,
    {
        let mut tally = self.start(now);
        for event in events {
            tally.observe(&event?);
        }

        let weekly = tally.finish();
        tracing::debug!(
            timezone = %weekly.timezone,
            today = weekly.today_count,
            weekly_unique = weekly.weekly_unique_users,
            skipped = weekly.skipped_malformed,
            outside = weekly.outside_window,
            "Aggregated weekly activity"
        );
        Ok(weekly)
    }
}
