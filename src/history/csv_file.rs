// =============================================================================
// CSV-backed score history
// =============================================================================
//
// Layout:
//   Timestamp,Score
//   2024-03-14 09:00:00,72
//
// Timestamps are UTC.  The header is written whenever the file is created or
// found empty.  A file whose last row lacks a newline gets one before the next
// row.  Rows that fail to parse on read are skipped with a warning.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::history::HistoryRecorder;
use crate::types::ScoreRecord;

pub const HEADER: &str = "Timestamp,Score";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only CSV file of `(timestamp, score)` rows.
pub struct CsvHistory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_line(line: &str) -> Option<ScoreRecord> {
        let (ts, score) = line.split_once(',')?;
        let timestamp = NaiveDateTime::parse_from_str(ts.trim(), TIMESTAMP_FORMAT)
            .ok()?
            .and_utc();
        let score: u8 = score.trim().parse().ok()?;
        (score <= 100).then(|| ScoreRecord::new(timestamp, score))
    }

    fn persistence(&self, op: &str, e: std::io::Error) -> EngineError {
        EngineError::Persistence(format!("{op} {}: {e}", self.path.display()))
    }

    /// `None` for an empty file, otherwise whether it ends with a newline.
    fn ends_with_newline(&self, file: &mut File) -> Result<Option<bool>, EngineError> {
        let len = file.metadata().map_err(|e| self.persistence("stat", e))?.len();
        if len == 0 {
            return Ok(None);
        }
        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))
            .and_then(|_| file.read_exact(&mut last))
            .map_err(|e| self.persistence("read", e))?;
        Ok(Some(last[0] == b'\n'))
    }
}

impl HistoryRecorder for CsvHistory {
    fn append(&self, record: &ScoreRecord) -> Result<(), EngineError> {
        let _guard = self.write_lock.lock();

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.persistence("open", e))?;

        let mut row = String::new();
        match self.ends_with_newline(&mut file)? {
            None => {
                row.push_str(HEADER);
                row.push('\n');
            }
            Some(false) => row.push('\n'),
            Some(true) => {}
        }
        row.push_str(&format!(
            "{},{}\n",
            record.timestamp.format(TIMESTAMP_FORMAT),
            record.score
        ));

        file.write_all(row.as_bytes())
            .map_err(|e| self.persistence("write", e))?;

        debug!(path = %self.path.display(), score = record.score, "score appended");
        Ok(())
    }

    fn records(&self) -> Result<Vec<ScoreRecord>, EngineError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (n, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line == HEADER {
                continue;
            }
            match Self::parse_line(line) {
                Some(r) => records.push(r),
                None => warn!(path = %self.path.display(), line = n + 1, "skipping malformed history row"),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(hour: u32, score: u8) -> ScoreRecord {
        ScoreRecord::new(Utc.with_ymd_and_hms(2024, 3, 14, hour, 0, 0).unwrap(), score)
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = CsvHistory::new(dir.path().join("none.csv"));
        assert!(history.records().unwrap().is_empty());
    }

    #[test]
    fn append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let history = CsvHistory::new(&path);
        history.append(&record(9, 72)).unwrap();
        history.append(&record(10, 72)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Timestamp,Score\n2024-03-14 09:00:00,72\n2024-03-14 10:00:00,72\n"
        );
    }

    #[test]
    fn records_survive_reopen_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        {
            let history = CsvHistory::new(&path);
            history.append(&record(1, 10)).unwrap();
            history.append(&record(2, 55)).unwrap();
        }
        let history = CsvHistory::new(&path);
        history.append(&record(3, 100)).unwrap();
        let all = history.records().unwrap();
        assert_eq!(all, vec![record(1, 10), record(2, 55), record(3, 100)]);
    }

    #[test]
    fn append_after_unterminated_row_starts_new_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        std::fs::write(&path, "Timestamp,Score\n2024-03-14 01:00:00,10").unwrap();

        let history = CsvHistory::new(&path);
        history.append(&record(2, 55)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Timestamp,Score\n2024-03-14 01:00:00,10\n2024-03-14 02:00:00,55\n"
        );
        assert_eq!(content.matches(HEADER).count(), 1);
        assert_eq!(history.records().unwrap(), vec![record(1, 10), record(2, 55)]);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        std::fs::write(
            &path,
            "Timestamp,Score\nnot a date,5\n2024-03-14 01:00:00,250\n2024-03-14 02:00:00,42\n",
        )
        .unwrap();
        let all = CsvHistory::new(&path).records().unwrap();
        assert_eq!(all, vec![record(2, 42)]);
    }

    #[test]
    fn unwritable_path_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let history = CsvHistory::new(dir.path().join("missing-dir").join("history.csv"));
        assert!(matches!(
            history.append(&record(1, 1)),
            Err(EngineError::Persistence(_))
        ));
    }

    #[test]
    fn concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let history = std::sync::Arc::new(CsvHistory::new(dir.path().join("history.csv")));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let h = history.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        h.append(&record(i, i as u8)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(history.records().unwrap().len(), 200);
    }
}
