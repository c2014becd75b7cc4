//! Analytics error types

use thiserror::Error;

/// Errors that can occur while setting up an aggregation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    /// Time zone name is not a known IANA zone
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),
}

/// Result type for analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
