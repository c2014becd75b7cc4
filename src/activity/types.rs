//! Core data types for the activity log
//!
//! This module defines the fundamental types used by the activity layer:
//! - `ActivityEvent`: A validated user action at a point in time
//! - `ActivityRecord`: The raw, possibly malformed, stored form of an event
//! - `TimestampValue`: The timestamp shapes accepted on the wire and on disk
//! - `AsActivity`: Read access shared by events and records

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded user action
///
/// Immutable once recorded. Timestamps are Unix milliseconds (UTC).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityEvent {
    /// Identifier of the acting user
    pub user_id: String,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// What the user did (e.g. "view_idol", "comment", "favorite")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl ActivityEvent {
    /// Create an event at the current time
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp: Utc::now().timestamp_millis(),
            action: None,
        }
    }

    /// Create an event with a specific timestamp
    pub fn with_timestamp(user_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp,
            action: None,
        }
    }

    /// Builder method: set the action label
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

/// Timestamp as it appears in stored or submitted records
///
/// Accepts epoch milliseconds, RFC 3339 text, or a document-store
/// `{seconds, nanoseconds}` object. Anything else deserializes into
/// `Unrecognized` so that one odd field never rejects a whole record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TimestampValue {
    /// Unix milliseconds
    Millis(i64),
    /// RFC 3339 / ISO 8601 text, or a millisecond count as a string
    Text(String),
    /// Document-store timestamp object
    Document {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    /// Any other JSON value
    Unrecognized(serde_json::Value),
}

impl TimestampValue {
    /// Resolve to Unix milliseconds, if the value is well formed
    pub fn millis(&self) -> Option<i64> {
        match self {
            TimestampValue::Millis(ms) => Some(*ms),
            TimestampValue::Text(text) => parse_timestamp_text(text),
            TimestampValue::Document {
                seconds,
                nanoseconds,
            } => seconds
                .checked_mul(1000)?
                .checked_add(i64::from(*nanoseconds / 1_000_000)),
            TimestampValue::Unrecognized(_) => None,
        }
    }

    /// Resolve to a UTC instant, if the value is well formed and in range
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.millis()?)
    }
}

impl From<i64> for TimestampValue {
    fn from(ms: i64) -> Self {
        TimestampValue::Millis(ms)
    }
}

/// Parse a textual timestamp into Unix milliseconds
///
/// Naive date-times without an offset are read as UTC.
pub fn parse_timestamp_text(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }

    let naive_formats = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    for fmt in naive_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    text.parse::<i64>().ok()
}

/// Raw activity record as stored in the log
///
/// Every field is optional: records are accepted as-is and validated
/// only when they are turned into events.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivityRecord {
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<TimestampValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl ActivityRecord {
    /// Convert into a validated event, or `None` if the record is malformed
    pub fn to_event(&self) -> Option<ActivityEvent> {
        let user_id = self.user_id()?.to_string();
        let timestamp = self.occurred_at()?.timestamp_millis();
        Some(ActivityEvent {
            user_id,
            timestamp,
            action: self.action.clone(),
        })
    }
}

impl From<ActivityEvent> for ActivityRecord {
    fn from(event: ActivityEvent) -> Self {
        Self {
            user_id: Some(event.user_id),
            timestamp: Some(TimestampValue::Millis(event.timestamp)),
            action: event.action,
        }
    }
}

/// Read access to the fields the aggregators need
///
/// Implementations return `None` for anything missing or malformed;
/// callers treat such items as excluded input, never as errors.
pub trait AsActivity {
    /// Non-empty user identifier
    fn user_id(&self) -> Option<&str>;

    /// When the action happened
    fn occurred_at(&self) -> Option<DateTime<Utc>>;

    /// Action label, if any
    fn action(&self) -> Option<&str> {
        None
    }
}

impl AsActivity for ActivityEvent {
    fn user_id(&self) -> Option<&str> {
        Some(self.user_id.as_str()).filter(|id| !id.trim().is_empty())
    }

    fn occurred_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

impl AsActivity for ActivityRecord {
    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_ref()?.instant()
    }

    fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

impl<T: AsActivity + ?Sized> AsActivity for &T {
    fn user_id(&self) -> Option<&str> {
        (**self).user_id()
    }

    fn occurred_at(&self) -> Option<DateTime<Utc>> {
        (**self).occurred_at()
    }

    fn action(&self) -> Option<&str> {
        (**self).action()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = ActivityEvent::with_timestamp("u1", 1_000).action("comment");

        assert_eq!(event.user_id, "u1");
        assert_eq!(event.timestamp, 1_000);
        assert_eq!(AsActivity::action(&event), Some("comment"));
    }

    #[test]
    fn test_timestamp_shapes() {
        let millis: TimestampValue = serde_json::from_str("1710064800000").unwrap();
        assert_eq!(millis.millis(), Some(1_710_064_800_000));

        let text: TimestampValue = serde_json::from_str(r#""2024-03-10T10:00:00Z""#).unwrap();
        assert_eq!(text.millis(), Some(1_710_064_800_000));

        let doc: TimestampValue =
            serde_json::from_str(r#"{"seconds": 1710064800, "nanoseconds": 250000000}"#).unwrap();
        assert_eq!(doc.millis(), Some(1_710_064_800_250));

        let underscored: TimestampValue =
            serde_json::from_str(r#"{"_seconds": 1710064800, "_nanoseconds": 0}"#).unwrap();
        assert_eq!(underscored.millis(), Some(1_710_064_800_000));

        let odd: TimestampValue = serde_json::from_str("true").unwrap();
        assert_eq!(odd, TimestampValue::Unrecognized(serde_json::Value::Bool(true)));
        assert_eq!(odd.millis(), None);
    }

    #[test]
    fn test_parse_timestamp_text() {
        assert_eq!(
            parse_timestamp_text("2024-03-10T19:00:00+09:00"),
            Some(1_710_064_800_000)
        );
        assert_eq!(
            parse_timestamp_text("2024-03-10 10:00:00"),
            Some(1_710_064_800_000)
        );
        assert_eq!(parse_timestamp_text("1710064800000"), Some(1_710_064_800_000));
        assert_eq!(parse_timestamp_text("yesterday-ish"), None);
        assert_eq!(parse_timestamp_text("   "), None);
    }

    #[test]
    fn test_record_to_event() {
        let record: ActivityRecord =
            serde_json::from_str(r#"{"userId": "a", "timestamp": 1000, "action": "favorite"}"#)
                .unwrap();
        let event = record.to_event().unwrap();
        assert_eq!(event.user_id, "a");
        assert_eq!(event.timestamp, 1000);
        assert_eq!(event.action.as_deref(), Some("favorite"));
    }

    #[test]
    fn test_malformed_records() {
        let no_user: ActivityRecord = serde_json::from_str(r#"{"timestamp": 1000}"#).unwrap();
        assert!(no_user.to_event().is_none());

        let blank_user: ActivityRecord =
            serde_json::from_str(r#"{"user_id": "  ", "timestamp": 1000}"#).unwrap();
        assert!(blank_user.to_event().is_none());

        let bad_time: ActivityRecord =
            serde_json::from_str(r#"{"user_id": "a", "timestamp": "not a date"}"#).unwrap();
        assert!(bad_time.to_event().is_none());

        let no_time: ActivityRecord = serde_json::from_str(r#"{"user_id": "a"}"#).unwrap();
        assert!(no_time.occurred_at().is_none());

        let out_of_range = ActivityRecord {
            user_id: Some("a".to_string()),
            timestamp: Some(TimestampValue::Millis(i64::MAX)),
            action: None,
        };
        assert!(out_of_range.to_event().is_none());
    }

    #[test]
    fn test_record_serialization_skips_empty_fields() {
        let record = ActivityRecord::from(ActivityEvent::with_timestamp("a", 5));
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"user_id":"a","timestamp":5}"#);
    }
}
