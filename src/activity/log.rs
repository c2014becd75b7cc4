//! Append-only activity log
//!
//! Every recorded action is persisted before it is acknowledged. The log is
//! the input collaborator for the analytics layer: it is streamed line by
//! line into the aggregators, never materialized.
//!
//! Format: one JSON object (`ActivityRecord`) per line.
//!
//! Replay is tolerant: a line that is not valid JSON is logged and skipped,
//! only I/O failures surface as errors.

use crate::activity::error::ActivityResult;
use crate::activity::types::ActivityRecord;
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Split, Take, Write};
use std::path::{Path, PathBuf};

/// Sync strategy for log writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSyncMode {
    /// Fsync after every write (safest, slowest)
    EveryWrite,
    /// Fsync in batches (balanced)
    #[default]
    Batched,
    /// No fsync, rely on OS (fastest, risk of loss)
    None,
}

/// Append-only JSON-lines activity log
#[derive(Debug)]
pub struct ActivityLog {
    /// File handle for writing
    writer: BufWriter<File>,
    /// Path to the log file
    path: PathBuf,
    /// Number of lines in the log
    entry_count: u64,
    /// Bytes written since last sync
    bytes_since_sync: usize,
    /// Sync mode
    sync_mode: LogSyncMode,
    /// Batch sync threshold (bytes)
    sync_threshold: usize,
}

impl ActivityLog {
    /// File name used inside a data directory
    pub const FILE_NAME: &'static str = "activity.jsonl";

    /// Open or create a log file
    pub fn open(path: impl AsRef<Path>, sync_mode: LogSyncMode) -> ActivityResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let entry_count = Self::count_entries(&path)?;
        tracing::debug!(path = ?path, entries = entry_count, "Opened activity log");

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            entry_count,
            bytes_since_sync: 0,
            sync_mode,
            sync_threshold: 64 * 1024,
        })
    }

    /// Open the log inside a data directory
    pub fn open_in_dir(data_dir: impl AsRef<Path>, sync_mode: LogSyncMode) -> ActivityResult<Self> {
        Self::open(data_dir.as_ref().join(Self::FILE_NAME), sync_mode)
    }

    /// Count non-blank lines in an existing log
    fn count_entries(path: &Path) -> ActivityResult<u64> {
        let reader = BufReader::new(File::open(path)?);
        let mut count = 0u64;
        for line in reader.split(b'\n') {
            if !is_blank(&line?) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Append a record to the log
    pub fn append(&mut self, record: &ActivityRecord) -> ActivityResult<()> {
        self.write_line(record)?;
        self.maybe_sync()
    }

    /// Append multiple records, syncing once at the end
    pub fn append_batch(&mut self, records: &[ActivityRecord]) -> ActivityResult<()> {
        for record in records {
            self.write_line(record)?;
        }
        self.maybe_sync()
    }

    fn write_line(&mut self, record: &ActivityRecord) -> ActivityResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;

        self.entry_count += 1;
        self.bytes_since_sync += line.len();
        Ok(())
    }

    /// Conditionally sync based on mode and threshold
    fn maybe_sync(&mut self) -> ActivityResult<()> {
        match self.sync_mode {
            LogSyncMode::EveryWrite => self.sync()?,
            LogSyncMode::Batched => {
                if self.bytes_since_sync >= self.sync_threshold {
                    self.sync()?;
                } else {
                    self.writer.flush()?;
                }
            }
            LogSyncMode::None => self.writer.flush()?,
        }
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> ActivityResult<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.bytes_since_sync = 0;
        Ok(())
    }

    /// Flush buffered writes without forcing them to disk
    pub fn flush(&mut self) -> ActivityResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and capture the current end of the log
    ///
    /// The snapshot can be replayed without holding the log, later appends
    /// are not visible to it.
    pub fn snapshot(&mut self) -> ActivityResult<LogSnapshot> {
        self.flush()?;
        Ok(LogSnapshot {
            path: self.path.clone(),
            len: self.file_size()?,
        })
    }

    /// Stream every record currently in the log
    pub fn records(&mut self) -> ActivityResult<Records> {
        self.snapshot()?.records()
    }

    /// Read every record currently in the log
    pub fn read_all(&mut self) -> ActivityResult<Vec<ActivityRecord>> {
        self.records()?.collect()
    }

    /// Stream the records of a log file without opening it for writing
    pub fn replay(path: impl AsRef<Path>) -> ActivityResult<Records> {
        Self::replay_prefix(path, u64::MAX)
    }

    /// Stream the records in the first `len` bytes of a log file
    pub fn replay_prefix(path: impl AsRef<Path>, len: u64) -> ActivityResult<Records> {
        let file = File::open(path.as_ref())?;
        Ok(Records {
            lines: BufReader::new(file.take(len)).split(b'\n'),
            line_no: 0,
            skipped: 0,
        })
    }

    /// Number of records in the log
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the file size
    pub fn file_size(&self) -> ActivityResult<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }
}

/// Log contents up to a fixed length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSnapshot {
    pub path: PathBuf,
    pub len: u64,
}

impl LogSnapshot {
    /// Stream the records covered by the snapshot
    pub fn records(&self) -> ActivityResult<Records> {
        ActivityLog::replay_prefix(&self.path, self.len)
    }
}

/// Streaming replay of a log file
#[derive(Debug)]
pub struct Records {
    lines: Split<BufReader<Take<File>>>,
    line_no: u64,
    skipped: u64,
}

impl Records {
    /// Lines skipped so far because they were not valid records
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Iterator for Records {
    type Item = ActivityResult<ActivityRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;

            if is_blank(&line) {
                continue;
            }

            // Bytes, not str: a torn write may leave invalid UTF-8 behind
            match serde_json::from_slice::<ActivityRecord>(&line) {
                Ok(record) => return Some(Ok(record)),
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!(line = self.line_no, error = %e, "Skipping corrupt activity log line");
                }
            }
        }
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::types::ActivityEvent;
    use tempfile::tempdir;

    fn record(user: &str, timestamp: i64) -> ActivityRecord {
        ActivityEvent::with_timestamp(user, timestamp).into()
    }

    #[test]
    fn test_log_basic_operations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");

        {
            let mut log = ActivityLog::open(&path, LogSyncMode::EveryWrite).unwrap();
            log.append(&record("a", 1000)).unwrap();
            log.append(&record("b", 2000)).unwrap();
            assert_eq!(log.entry_count(), 2);
        }

        let mut log = ActivityLog::open(&path, LogSyncMode::EveryWrite).unwrap();
        let records = log.read_all().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].user_id.as_deref(), Some("a"));
        assert_eq!(records[1].to_event().unwrap().timestamp, 2000);
    }

    #[test]
    fn test_log_batch_append() {
        let dir = tempdir().unwrap();
        let mut log = ActivityLog::open_in_dir(dir.path(), LogSyncMode::Batched).unwrap();

        let records: Vec<ActivityRecord> = (0..100).map(|i| record("u", i * 1000)).collect();
        log.append_batch(&records).unwrap();

        assert_eq!(log.entry_count(), 100);
        assert_eq!(log.read_all().unwrap().len(), 100);
        assert!(dir.path().join(ActivityLog::FILE_NAME).exists());
    }

    #[test]
    fn test_log_skips_corrupt_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        std::fs::write(
            &path,
            "{\"user_id\":\"a\",\"timestamp\":1000}\nnot json at all\n\n{\"user_id\":\"b\"}\n",
        )
        .unwrap();

        let mut records = ActivityLog::replay(&path).unwrap();
        let first = records.next().unwrap().unwrap();
        let second = records.next().unwrap().unwrap();

        assert_eq!(first.user_id.as_deref(), Some("a"));
        // Kept: valid JSON, malformed event
        assert_eq!(second.user_id.as_deref(), Some("b"));
        assert!(second.to_event().is_none());
        assert!(records.next().is_none());
        assert_eq!(records.skipped(), 1);
    }

    #[test]
    fn test_log_survives_invalid_utf8_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let mut bytes = b"{\"user_id\":\"a\",\"timestamp\":1000}\n".to_vec();
        bytes.extend_from_slice(b"{\"user_id\":\"\xEC\xA7\n");
        bytes.extend_from_slice(b"{\"user_id\":\"b\",\"timestamp\":2000}\n");
        std::fs::write(&path, &bytes).unwrap();

        let mut log = ActivityLog::open(&path, LogSyncMode::None).unwrap();
        assert_eq!(log.entry_count(), 3);

        let mut records = log.records().unwrap();
        let users: Vec<String> = records
            .by_ref()
            .map(|r| r.unwrap().user_id.unwrap())
            .collect();
        assert_eq!(users, vec!["a", "b"]);
        assert_eq!(records.skipped(), 1);

        log.append(&record("c", 3000)).unwrap();
        assert_eq!(log.read_all().unwrap().len(), 3);
    }

    #[test]
    fn test_log_persistence_across_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");

        {
            let mut log = ActivityLog::open(&path, LogSyncMode::None).unwrap();
            for i in 0..5 {
                log.append(&record("u", i)).unwrap();
            }
        }

        {
            let mut log = ActivityLog::open(&path, LogSyncMode::None).unwrap();
            assert_eq!(log.entry_count(), 5);
            for i in 5..10 {
                log.append(&record("u", i)).unwrap();
            }
        }

        let mut log = ActivityLog::open(&path, LogSyncMode::None).unwrap();
        assert_eq!(log.entry_count(), 10);
        assert_eq!(log.read_all().unwrap().len(), 10);
        assert!(log.file_size().unwrap() > 0);
    }

    #[test]
    fn test_snapshot_ignores_later_appends() {
        let dir = tempdir().unwrap();
        let mut log = ActivityLog::open_in_dir(dir.path(), LogSyncMode::Batched).unwrap();
        log.append(&record("a", 1000)).unwrap();
        log.append(&record("b", 2000)).unwrap();

        let snapshot = log.snapshot().unwrap();
        log.append(&record("c", 3000)).unwrap();

        let users: Vec<String> = snapshot
            .records()
            .unwrap()
            .map(|r| r.unwrap().user_id.unwrap())
            .collect();
        assert_eq!(users, vec!["a", "b"]);
        assert_eq!(log.read_all().unwrap().len(), 3);
    }

    #[test]
    fn test_replay_missing_file() {
        let dir = tempdir().unwrap();
        let result = ActivityLog::replay(dir.path().join("missing.jsonl"));
        assert!(result.is_err());
    }
}
