//! Append-only CSV result sink.
//!
//! One destination per engine. The header is written at most once per
//! destination lifetime (existence check, never truncation); the log grows
//! monotonically across repeated harness runs, and consumers must tolerate
//! that growth.
//!
//! Single-writer discipline: a destination belongs to one run at a time.
//! Concurrent runs against different engines are fine because each owns an
//! independent destination; pointing two concurrent runs at the same file
//! would interleave lines.

use crate::{HarnessError, HarnessResult, MeasurementRecord, WorkloadOperation};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Column names, shared with result files produced by earlier harness
/// versions (Notes is the one addition and stays empty for clean runs).
pub const CSV_HEADER: [&str; 6] = [
    "Timestamp",
    "Operation",
    "Duration(s)",
    "CPU(%)",
    "Memory(MB)",
    "Notes",
];

pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one measurement record, writing the header first if the
    /// destination does not exist yet.
    pub fn write(&self, record: &MeasurementRecord) -> HarnessResult<()> {
        self.append_row([
            record.timestamp.clone(),
            record.operation.label().to_string(),
            format!("{:.6}", record.duration_seconds),
            format!("{:.1}", record.cpu_percent),
            format!("{:.1}", record.memory_mb),
            record.notes.clone().unwrap_or_default(),
        ])
    }

    /// Append a failure entry for an operation that produced no measurement.
    /// Duration/CPU/Memory stay empty so the entry cannot be mistaken for a
    /// zero-duration success.
    pub fn write_failure(&self, operation: WorkloadOperation, message: &str) -> HarnessResult<()> {
        self.append_row([
            crate::probe::utc_timestamp(),
            operation.label().to_string(),
            String::new(),
            String::new(),
            String::new(),
            format!("FAILED: {}", message),
        ])
    }

    fn append_row(&self, fields: [String; 6]) -> HarnessResult<()> {
        let write_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| HarnessError::SinkWrite(format!("{}: {}", self.path.display(), e)))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if write_header {
            writer
                .write_record(CSV_HEADER)
                .map_err(|e| HarnessError::SinkWrite(e.to_string()))?;
        }
        writer
            .write_record(&fields)
            .map_err(|e| HarnessError::SinkWrite(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| HarnessError::SinkWrite(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(op: WorkloadOperation) -> MeasurementRecord {
        MeasurementRecord {
            timestamp: "2024-01-01 00:00:00".to_string(),
            operation: op,
            duration_seconds: 0.125,
            cpu_percent: 12.5,
            memory_mb: 2048.0,
            notes: None,
        }
    }

    fn lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn header_is_written_exactly_once_across_writes() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("results.csv"));

        sink.write(&record(WorkloadOperation::ReadIntensive)).unwrap();
        sink.write(&record(WorkloadOperation::Aggregation)).unwrap();

        let lines = lines(sink.path());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert!(lines[1].contains("Read-Intensive"));
        assert!(lines[2].contains("Aggregation"));
    }

    #[test]
    fn header_survives_a_second_sink_against_the_same_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        CsvSink::new(&path)
            .write(&record(WorkloadOperation::Mixed))
            .unwrap();
        CsvSink::new(&path)
            .write(&record(WorkloadOperation::Mixed))
            .unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("Timestamp")).count(),
            1
        );
    }

    #[test]
    fn failure_entries_leave_measurement_fields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("results.csv"));

        sink.write_failure(WorkloadOperation::Indexing, "index rejected")
            .unwrap();

        let lines = lines(sink.path());
        assert_eq!(lines.len(), 2);
        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields[1], "Indexing");
        assert_eq!(fields[2], "");
        assert_eq!(fields[3], "");
        assert_eq!(fields[4], "");
        assert!(fields[5].starts_with("FAILED:"));
    }

    #[test]
    fn unwritable_destination_is_a_sink_error() {
        let sink = CsvSink::new("/nonexistent-dir/results.csv");
        match sink.write(&record(WorkloadOperation::ReadIntensive)) {
            Err(HarnessError::SinkWrite(_)) => {}
            other => panic!("expected sink error, got {:?}", other),
        }
    }
}
