//! The harness driver: sequences setup → load → the five canonical
//! operations → teardown, probing around each operation and handing records
//! to the sink.
//!
//! Fatal errors (schema rejection, load failure) abort the run before any
//! operation executes. A single operation failing is non-fatal: operations
//! are independent, and one engine's missing capability must not block
//! measuring the rest. Teardown runs exactly once on every path.

use crate::probe;
use crate::resources::ResourceSampler;
use crate::sink::CsvSink;
use crate::{
    DatasetFixture, EngineAdapter, HarnessError, MeasurementRecord, WorkloadOperation,
    WorkloadParams,
};
use serde::Serialize;

/// Terminal state of one harness run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// All five operations were attempted (some may have failed).
    Done,
    /// Schema setup was rejected; nothing ran.
    AbortedSetup,
    /// Fixture load failed; no operations ran against the inconsistent
    /// baseline.
    AbortedLoad,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationFailure {
    pub operation: WorkloadOperation,
    pub message: String,
}

/// Final report of one run, returned to the caller after teardown.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub engine: String,
    pub outcome: RunOutcome,
    /// Why the run aborted, when it did.
    pub abort_reason: Option<String>,
    pub records: Vec<MeasurementRecord>,
    pub failures: Vec<OperationFailure>,
    /// Sink write failures. Non-fatal, but surfaced so results are not
    /// silently lost.
    pub sink_errors: Vec<String>,
}

impl RunSummary {
    /// Exit code contract: 0 when the run reached Done, even with some
    /// per-operation failures recorded; non-zero on abort.
    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            RunOutcome::Done => 0,
            RunOutcome::AbortedSetup | RunOutcome::AbortedLoad => 1,
        }
    }

    pub fn completed(&self) -> bool {
        self.outcome == RunOutcome::Done
    }

    fn aborted(engine: String, outcome: RunOutcome, reason: HarnessError) -> Self {
        Self {
            engine,
            outcome,
            abort_reason: Some(reason.to_string()),
            records: Vec::new(),
            failures: Vec::new(),
            sink_errors: Vec::new(),
        }
    }
}

/// Run the full workload against one engine.
///
/// Owns the adapter for the run's duration; the backend session is released
/// before this returns, on success and on every abort path.
pub fn run(
    mut adapter: Box<dyn EngineAdapter>,
    fixture: &DatasetFixture,
    params: &WorkloadParams,
    sampler: &ResourceSampler,
    sink: &CsvSink,
) -> RunSummary {
    let engine = adapter.name().to_string();

    tracing::info!(engine = %engine, "setup");
    if let Err(e) = adapter.setup() {
        tracing::error!(engine = %engine, error = %e, "setup failed, aborting");
        teardown(adapter.as_mut());
        return RunSummary::aborted(engine, RunOutcome::AbortedSetup, e);
    }

    tracing::info!(engine = %engine, rows = params.rows, "load");
    if let Err(e) = adapter.load(fixture, params.rows) {
        tracing::error!(engine = %engine, error = %e, "load failed, aborting");
        teardown(adapter.as_mut());
        return RunSummary::aborted(engine, RunOutcome::AbortedLoad, e);
    }

    let mut records = Vec::new();
    let mut failures = Vec::new();
    let mut sink_errors = Vec::new();

    for op in WorkloadOperation::ALL {
        tracing::info!(engine = %engine, operation = %op, "running");
        match probe::measure(op, sampler, || adapter.execute(op, params)) {
            Ok(record) => {
                if let Err(e) = sink.write(&record) {
                    tracing::warn!(engine = %engine, error = %e, "sink write failed");
                    sink_errors.push(e.to_string());
                }
                records.push(record);
            }
            Err(e) => {
                tracing::warn!(engine = %engine, operation = %op, error = %e, "operation failed, continuing");
                let message = e.to_string();
                if let Err(se) = sink.write_failure(op, &message) {
                    sink_errors.push(se.to_string());
                }
                failures.push(OperationFailure {
                    operation: op,
                    message,
                });
            }
        }
    }

    teardown(adapter.as_mut());

    RunSummary {
        engine,
        outcome: RunOutcome::Done,
        abort_reason: None,
        records,
        failures,
        sink_errors,
    }
}

fn teardown(adapter: &mut dyn EngineAdapter) {
    if let Err(e) = adapter.teardown() {
        tracing::warn!(engine = adapter.name(), error = %e, "teardown failed");
    }
}
