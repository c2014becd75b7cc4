//! CSV Import
//!
//! Bulk-loads activity exports. Columns are located by header name, so the
//! export may carry extra columns in any order.

use crate::activity::error::{ActivityError, ActivityResult};
use crate::activity::types::{parse_timestamp_text, ActivityRecord, TimestampValue};
use std::io::Read;
use std::path::Path;

/// Maximum number of per-row error messages kept in a result
const MAX_REPORTED_ERRORS: usize = 100;

/// CSV importer for activity exports
#[derive(Debug, Clone)]
pub struct CsvImporter {
    /// Header naming the user id column
    user_column: String,
    /// Header naming the timestamp column
    timestamp_column: String,
    /// Header naming the optional action column
    action_column: String,
}

/// Result of a CSV import operation
#[derive(Debug)]
pub struct CsvImportResult {
    pub records: Vec<ActivityRecord>,
    pub rows_processed: usize,
    pub rows_failed: usize,
    pub errors: Vec<String>,
}

/// Column positions resolved from the header row
struct ColumnMap {
    user: usize,
    timestamp: usize,
    action: Option<usize>,
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvImporter {
    /// Create an importer expecting `user_id`, `timestamp`, and `action` headers
    pub fn new() -> Self {
        Self {
            user_column: "user_id".to_string(),
            timestamp_column: "timestamp".to_string(),
            action_column: "action".to_string(),
        }
    }

    /// Set the user id header
    pub fn with_user_column(mut self, header: &str) -> Self {
        self.user_column = header.to_string();
        self
    }

    /// Set the timestamp header
    pub fn with_timestamp_column(mut self, header: &str) -> Self {
        self.timestamp_column = header.to_string();
        self
    }

    /// Set the action header
    pub fn with_action_column(mut self, header: &str) -> Self {
        self.action_column = header.to_string();
        self
    }

    /// Import records from a CSV file
    pub fn import(&self, path: &Path) -> ActivityResult<CsvImportResult> {
        let file = std::fs::File::open(path)?;
        self.import_reader(file)
    }

    /// Import from a CSV string
    pub fn import_str(&self, csv_data: &str) -> ActivityResult<CsvImportResult> {
        self.import_reader(csv_data.as_bytes())
    }

    /// Import from any reader
    pub fn import_reader<R: Read>(&self, input: R) -> ActivityResult<CsvImportResult> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let columns = self.resolve_columns(reader.headers()?)?;

        let mut records = Vec::new();
        let mut rows_processed = 0;
        let mut rows_failed = 0;
        let mut errors = Vec::new();

        for (row_idx, result) in reader.records().enumerate() {
            // Header is line 1
            let line = row_idx + 2;

            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    errors.push(format!("Line {}: {}", line, e));
                    rows_failed += 1;
                    continue;
                }
            };

            let user_id = row.get(columns.user).map(str::trim).unwrap_or_default();
            if user_id.is_empty() {
                errors.push(format!("Line {}: missing user id", line));
                rows_failed += 1;
                continue;
            }

            let ts_str = row.get(columns.timestamp).map(str::trim).unwrap_or_default();
            let timestamp = match parse_timestamp_text(ts_str) {
                Some(ms) => ms,
                None => {
                    errors.push(format!("Line {}: could not parse timestamp '{}'", line, ts_str));
                    rows_failed += 1;
                    continue;
                }
            };

            let action = columns
                .action
                .and_then(|idx| row.get(idx))
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string);

            records.push(ActivityRecord {
                user_id: Some(user_id.to_string()),
                timestamp: Some(TimestampValue::Millis(timestamp)),
                action,
            });
            rows_processed += 1;
        }

        if errors.len() > MAX_REPORTED_ERRORS {
            let total = errors.len();
            errors.truncate(MAX_REPORTED_ERRORS);
            errors.push(format!("... and {} more errors", total - MAX_REPORTED_ERRORS));
        }

        tracing::debug!(rows_processed, rows_failed, "CSV import finished");

        Ok(CsvImportResult {
            records,
            rows_processed,
            rows_failed,
            errors,
        })
    }

    fn resolve_columns(&self, headers: &csv::StringRecord) -> ActivityResult<ColumnMap> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let user = find(&self.user_column)
            .ok_or_else(|| ActivityError::MissingColumn(self.user_column.clone()))?;
        let timestamp = find(&self.timestamp_column)
            .ok_or_else(|| ActivityError::MissingColumn(self.timestamp_column.clone()))?;

        Ok(ColumnMap {
            user,
            timestamp,
            action: find(&self.action_column),
        })
    }
}
