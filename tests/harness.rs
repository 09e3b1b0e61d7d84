//! End-to-end harness behavior: the driver state machine against a
//! scriptable mock adapter, and a real run against the SQLite adapter.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use storebench::adapters::sqlite_adapter::SqliteAdapter;
use storebench::driver::{self, RunOutcome};
use storebench::resources::ResourceSampler;
use storebench::sink::{CsvSink, CSV_HEADER};
use storebench::{
    Capabilities, DatasetFixture, EngineAdapter, ExecOutcome, HarnessError, HarnessResult,
    WorkloadOperation, WorkloadParams,
};

// ────────────────────────────────────────────────────────────────────────────────
// Mock adapter
// ────────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MockAdapter {
    fail_setup: bool,
    fail_load: bool,
    fail_ops: Vec<WorkloadOperation>,
    calls: Arc<Mutex<Vec<String>>>,
    teardowns: Arc<AtomicUsize>,
}

impl MockAdapter {
    fn log(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl EngineAdapter for MockAdapter {
    fn name(&self) -> &str {
        "mock"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn setup(&mut self) -> HarnessResult<()> {
        self.log("setup");
        if self.fail_setup {
            return Err(HarnessError::Schema {
                engine: "mock".into(),
                message: "table definition rejected".into(),
            });
        }
        Ok(())
    }

    fn load(&mut self, _fixture: &DatasetFixture, count: usize) -> HarnessResult<()> {
        self.log("load");
        if self.fail_load {
            return Err(HarnessError::Load {
                engine: "mock".into(),
                committed: count / 2,
                message: "engine rejected the batch halfway".into(),
            });
        }
        Ok(())
    }

    fn execute(
        &mut self,
        op: WorkloadOperation,
        _params: &WorkloadParams,
    ) -> HarnessResult<ExecOutcome> {
        self.log(format!("execute:{}", op));
        if self.fail_ops.contains(&op) {
            return Err(HarnessError::Engine {
                engine: "mock".into(),
                message: format!("{} not available", op),
            });
        }
        Ok(ExecOutcome::clean())
    }

    fn teardown(&mut self) -> HarnessResult<()> {
        self.log("teardown");
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn sampler() -> ResourceSampler {
    ResourceSampler::new(Duration::from_millis(1))
}

fn params() -> WorkloadParams {
    WorkloadParams {
        rows: 100,
        write_burst: 10,
        mixed_rows: 5,
    }
}

fn lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| l.to_string())
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────────
// Driver state machine
// ────────────────────────────────────────────────────────────────────────────────

#[test]
fn full_run_produces_one_record_per_operation() {
    let dir = tempfile::tempdir().unwrap();
    let sink = CsvSink::new(dir.path().join("mock_results.csv"));
    let teardowns = Arc::new(AtomicUsize::new(0));
    let adapter = MockAdapter {
        teardowns: teardowns.clone(),
        ..Default::default()
    };

    let summary = driver::run(
        Box::new(adapter),
        &DatasetFixture::default(),
        &params(),
        &sampler(),
        &sink,
    );

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.records.len(), 5);
    assert!(summary.failures.is_empty());
    assert!(summary.sink_errors.is_empty());
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);

    // Exactly one record per canonical operation, in fixed order.
    let ops: Vec<WorkloadOperation> = summary.records.iter().map(|r| r.operation).collect();
    assert_eq!(ops, WorkloadOperation::ALL.to_vec());
    for r in &summary.records {
        assert!(r.duration_seconds >= 0.0);
    }

    // Fresh destination: 1 header + 5 data lines.
    let lines = lines(sink.path());
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], CSV_HEADER.join(","));
}

#[test]
fn repeated_runs_grow_the_sink_without_a_second_header() {
    let dir = tempfile::tempdir().unwrap();
    let sink = CsvSink::new(dir.path().join("mock_results.csv"));

    for _ in 0..2 {
        let summary = driver::run(
            Box::new(MockAdapter::default()),
            &DatasetFixture::default(),
            &params(),
            &sampler(),
            &sink,
        );
        assert_eq!(summary.outcome, RunOutcome::Done);
    }

    let lines = lines(sink.path());
    assert_eq!(lines.len(), 11);
    assert_eq!(
        lines.iter().filter(|l| l.starts_with("Timestamp")).count(),
        1
    );
}

#[test]
fn setup_failure_aborts_with_teardown() {
    let dir = tempfile::tempdir().unwrap();
    let sink = CsvSink::new(dir.path().join("mock_results.csv"));
    let calls = Arc::new(Mutex::new(Vec::new()));
    let teardowns = Arc::new(AtomicUsize::new(0));
    let adapter = MockAdapter {
        fail_setup: true,
        calls: calls.clone(),
        teardowns: teardowns.clone(),
        ..Default::default()
    };

    let summary = driver::run(
        Box::new(adapter),
        &DatasetFixture::default(),
        &params(),
        &sampler(),
        &sink,
    );

    assert_eq!(summary.outcome, RunOutcome::AbortedSetup);
    assert_ne!(summary.exit_code(), 0);
    assert!(summary.records.is_empty());
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    assert_eq!(*calls.lock().unwrap(), vec!["setup", "teardown"]);
    assert!(!sink.path().exists());
}

#[test]
fn load_failure_aborts_before_any_operation_executes() {
    let dir = tempfile::tempdir().unwrap();
    let sink = CsvSink::new(dir.path().join("mock_results.csv"));
    let calls = Arc::new(Mutex::new(Vec::new()));
    let teardowns = Arc::new(AtomicUsize::new(0));
    let adapter = MockAdapter {
        fail_load: true,
        calls: calls.clone(),
        teardowns: teardowns.clone(),
        ..Default::default()
    };

    let summary = driver::run(
        Box::new(adapter),
        &DatasetFixture::default(),
        &params(),
        &sampler(),
        &sink,
    );

    assert_eq!(summary.outcome, RunOutcome::AbortedLoad);
    assert!(summary
        .abort_reason
        .as_deref()
        .unwrap()
        .contains("50 rows committed"));
    assert!(calls
        .lock()
        .unwrap()
        .iter()
        .all(|c| !c.starts_with("execute")));
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}

#[test]
fn one_failing_operation_does_not_block_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let sink = CsvSink::new(dir.path().join("mock_results.csv"));
    let adapter = MockAdapter {
        fail_ops: vec![WorkloadOperation::Indexing],
        ..Default::default()
    };

    let summary = driver::run(
        Box::new(adapter),
        &DatasetFixture::default(),
        &params(),
        &sampler(),
        &sink,
    );

    // The run still completes and exits 0.
    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.records.len(), 4);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].operation, WorkloadOperation::Indexing);

    // The failure is logged as a failure entry, keeping one line per
    // operation: 1 header + 4 records + 1 failure row.
    let lines = lines(sink.path());
    assert_eq!(lines.len(), 6);
    let failure_line = lines.iter().find(|l| l.contains("FAILED:")).unwrap();
    assert!(failure_line.contains("Indexing"));
}

#[test]
fn sink_failure_is_nonfatal_and_surfaced() {
    let sink = CsvSink::new("/nonexistent-dir/mock_results.csv");

    let summary = driver::run(
        Box::new(MockAdapter::default()),
        &DatasetFixture::default(),
        &params(),
        &sampler(),
        &sink,
    );

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(summary.records.len(), 5);
    assert_eq!(summary.sink_errors.len(), 5);
}

// ────────────────────────────────────────────────────────────────────────────────
// SQLite end-to-end
// ────────────────────────────────────────────────────────────────────────────────

#[test]
fn sqlite_end_to_end_run() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("bench.sqlite3");
    let sink = CsvSink::new(dir.path().join("sqlite_results.csv"));
    let adapter = SqliteAdapter::open(&db_path).unwrap();

    let params = WorkloadParams {
        rows: 200,
        write_burst: 50,
        mixed_rows: 10,
    };
    let summary = driver::run(
        Box::new(adapter),
        &DatasetFixture::default(),
        &params,
        &sampler(),
        &sink,
    );

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(summary.records.len(), 5);
    assert!(summary.failures.is_empty());

    // Load rows plus the write burst survive; Mixed cleaned up after itself.
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))
        .unwrap();
    assert_eq!(total, 200 + 50);
    let mixed: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM reviews WHERE reviewer_id = 'mixed'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(mixed, 0);

    let lines = lines(sink.path());
    assert_eq!(lines.len(), 6);
}
