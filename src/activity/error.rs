//! Activity layer error types
//!
//! Defines all errors that can occur while recording, replaying, or
//! importing activity.

use thiserror::Error;

/// Errors that can occur in the activity layer
#[derive(Error, Debug)]
pub enum ActivityError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// CSV input could not be read
    #[error("CSV error: {0}")]
    Csv(String),

    /// Import input lacks a required column
    #[error("Missing column: {0}")]
    MissingColumn(String),
}

impl From<serde_json::Error> for ActivityError {
    fn from(err: serde_json::Error) -> Self {
        ActivityError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for ActivityError {
    fn from(err: csv::Error) -> Self {
        ActivityError::Csv(err.to_string())
    }
}

/// Result type alias for activity operations
pub type ActivityResult<T> = Result<T, ActivityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ActivityError::MissingColumn("user_id".to_string());
        assert_eq!(err.to_string(), "Missing column: user_id");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let activity_err: ActivityError = io_err.into();
        assert!(matches!(activity_err, ActivityError::Io(_)));
    }
}
