//! Reporting time zone
//!
//! All calendar-date derivation goes through a `ReportingZone` so that a
//! day boundary means the same thing on every host. `local` opts into the
//! process time zone; anything else must be an IANA zone name.

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use chrono::{DateTime, Days, Duration, Local, LocalResult, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

/// Time zone in which calendar days are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportingZone {
    /// Time zone of the running process
    Local,
    /// Fixed IANA zone
    Named(Tz),
}

impl Default for ReportingZone {
    fn default() -> Self {
        ReportingZone::Named(Tz::UTC)
    }
}

impl ReportingZone {
    /// Parse a zone name (`"UTC"`, `"Asia/Seoul"`, `"local"`)
    pub fn parse(name: &str) -> AnalyticsResult<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("local") {
            return Ok(ReportingZone::Local);
        }
        name.parse::<Tz>()
            .map(ReportingZone::Named)
            .map_err(|_| AnalyticsError::UnknownTimeZone(name.to_string()))
    }

    /// Calendar date of an instant in this zone
    pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            ReportingZone::Local => at.with_timezone(&Local).date_naive(),
            ReportingZone::Named(tz) => at.with_timezone(tz).date_naive(),
        }
    }

    /// First instant of a calendar date in this zone
    ///
    /// Usually local midnight. When a DST gap swallows midnight the day
    /// starts where the gap ends. `None` only for dates chrono cannot
    /// represent.
    pub fn start_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        match self {
            ReportingZone::Local => first_instant(&Local, date),
            ReportingZone::Named(tz) => first_instant(tz, date),
        }
    }
}

fn first_instant<Z: TimeZone>(zone: &Z, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    match zone.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            // Midnight read with the offset in force before the gap is the
            // transition instant itself
            let before = zone
                .from_local_datetime(&(midnight - Duration::hours(12)))
                .earliest()?;
            let offset = before.offset().fix().local_minus_utc();
            let utc = midnight - Duration::seconds(i64::from(offset));
            Some(Utc.from_utc_datetime(&utc))
        }
    }
}

impl FromStr for ReportingZone {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ReportingZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportingZone::Local => write!(f, "local"),
            ReportingZone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

/// The `days` consecutive calendar dates ending at `last`, oldest first
///
/// Works on dates rather than instants, so DST shifts never skip or repeat
/// a day.
pub fn window_ending(last: NaiveDate, days: usize) -> Vec<NaiveDate> {
    (0..days as u64)
        .rev()
        .filter_map(|back| last.checked_sub_days(Days::new(back)))
        .collect()
}

/// Short English weekday name ("Mon", "Tue", ...)
pub fn short_weekday(date: NaiveDate) -> String {
    date.format("%a").to_string()
}
