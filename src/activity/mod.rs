//! Activity Layer
//!
//! Records and replays the user actions the dashboard statistics are built
//! from:
//!
//! - **types**: Core data structures (ActivityEvent, ActivityRecord)
//! - **log**: Append-only JSON-lines activity log
//! - **csv_import**: Bulk import of activity exports
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use idolboard::activity::{ActivityEvent, ActivityLog, LogSyncMode};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut log = ActivityLog::open_in_dir("./idolboard_data", LogSyncMode::Batched)?;
//!     log.append(&ActivityEvent::new("user-42").action("favorite").into())?;
//!
//!     let records = log.read_all()?;
//!     println!("{} records logged", records.len());
//!     Ok(())
//! }
//! ```

pub mod csv_import;
pub mod error;
pub mod log;
pub mod types;

pub use csv_import::{CsvImportResult, CsvImporter};
pub use error::{ActivityError, ActivityResult};
pub use log::{ActivityLog, LogSnapshot, LogSyncMode, Records};
pub use types::{parse_timestamp_text, ActivityEvent, ActivityRecord, AsActivity, TimestampValue};
