//! Append-only trial logs. One CSV per participant, task and run; the header
//! goes in with the first row and every append is flushed before the next
//! trial starts.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use cogbat_core::TrialRecord;

use crate::error::Result;

/// Schema tag carried in the log filename.
pub const LOG_SCHEMA_VERSION: &str = "v1";

/// The runner's storage seam. Absence of the underlying file is an ordinary
/// state (`exists`/`is_empty`), not an error.
pub trait TrialLog {
    fn exists(&self) -> bool;
    fn is_empty(&self) -> Result<bool>;
    fn append(&mut self, record: &TrialRecord) -> Result<()>;
    fn read_all(&self) -> Result<Vec<TrialRecord>>;
}

/// CSV-file-backed log.
pub struct CsvTrialLog {
    path: PathBuf,
}

impl CsvTrialLog {
    /// Log for one run, named `{task}_p{id}_{timestamp}_{schema}.csv` under
    /// `data_dir` (created if needed).
    pub fn create(
        data_dir: &Path,
        task: &str,
        participant: u32,
        started: &DateTime<Local>,
    ) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let name = format!(
            "{}_p{:03}_{}_{}.csv",
            task,
            participant,
            started.format("%Y%m%d_%H%M%S"),
            LOG_SCHEMA_VERSION,
        );
        Ok(Self {
            path: data_dir.join(name),
        })
    }

    /// Open a log at an explicit path (resuming a run, or tests).
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrialLog for CsvTrialLog {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn is_empty(&self) -> Result<bool> {
        if !self.exists() {
            return Ok(true);
        }
        Ok(self.read_all()?.is_empty())
    }

    fn append(&mut self, record: &TrialRecord) -> Result<()> {
        let write_header = !self.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<TrialRecord>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }
}

/// In-memory log for tests and headless runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryTrialLog {
    rows: Vec<TrialRecord>,
}

impl MemoryTrialLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<TrialRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[TrialRecord] {
        &self.rows
    }
}

impl TrialLog for MemoryTrialLog {
    fn exists(&self) -> bool {
        !self.rows.is_empty()
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.rows.is_empty())
    }

    fn append(&mut self, record: &TrialRecord) -> Result<()> {
        self.rows.push(record.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<TrialRecord>> {
        Ok(self.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(block: u32, trial: u32) -> TrialRecord {
        let mut r = TrialRecord::pending(
            12,
            block,
            trial,
            trial,
            "stroop",
            "incongruent",
            "BLUE/red",
            84,
        );
        r.response = Some("d".to_string());
        r.rt_s = Some(0.612);
        r.correct = Some(true);
        r.elapsed_s = 42.5;
        r
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = CsvTrialLog::at_path(dir.path().join("never_written.csv"));
        assert!(!log.exists());
        assert!(log.is_empty().unwrap());
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn rows_round_trip_including_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = CsvTrialLog::at_path(dir.path().join("trials.csv"));

        let full = sample(1, 1);
        let miss = TrialRecord::pending(12, 1, 2, 2, "stroop", "congruent", "RED/red", 84);
        log.append(&full).unwrap();
        log.append(&miss).unwrap();

        let rows = log.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], full);
        assert_eq!(rows[1], miss);
        assert!(rows[1].response.is_none());
        assert!(rows[1].correct.is_none());
    }

    #[test]
    fn header_is_written_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trials.csv");
        let mut log = CsvTrialLog::at_path(path.clone());
        log.append(&sample(1, 1)).unwrap();
        log.append(&sample(1, 2)).unwrap();
        log.append(&sample(2, 1)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let headers = text
            .lines()
            .filter(|l| l.starts_with("participant,"))
            .count();
        assert_eq!(headers, 1);
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn create_names_file_after_task_participant_and_run() {
        let dir = tempfile::tempdir().unwrap();
        let started = Local::now();
        let log = CsvTrialLog::create(dir.path(), "search", 7, &started).unwrap();
        let name = log.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("search_p007_"));
        assert!(name.ends_with("_v1.csv"));
    }
}
