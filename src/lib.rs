//! Shared types, the engine adapter contract, and the error taxonomy for
//! storebench.
//!
//! The harness runs one canonical workload (bulk load, then five timed
//! operations) against heterogeneous storage engines and records every
//! measurement in one comparable format. Engines plug in through
//! [`EngineAdapter`]; everything else is engine-agnostic.

pub mod adapters;
pub mod config;
pub mod driver;
pub mod probe;
pub mod report;
pub mod resources;
pub mod sink;

use serde::{Deserialize, Serialize};
use std::fmt;

// ────────────────────────────────────────────────────────────────────────────────
// Error taxonomy
// ────────────────────────────────────────────────────────────────────────────────

pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Setup/DDL rejected by the engine. Fatal: the run aborts.
    #[error("{engine}: schema setup rejected: {message}")]
    Schema { engine: String, message: String },

    /// Fixture insertion failed or partially failed. Fatal: later
    /// measurements would run against an inconsistent baseline.
    #[error("{engine}: load failed with {committed} rows committed: {message}")]
    Load {
        engine: String,
        committed: usize,
        message: String,
    },

    /// An engine call inside a workload operation failed.
    #[error("{engine}: {message}")]
    Engine { engine: String, message: String },

    /// One canonical operation failed. Non-fatal: the run skips it and
    /// continues with the remaining operations.
    #[error("operation {operation} failed: {message}")]
    Operation {
        operation: WorkloadOperation,
        message: String,
    },

    /// Result log append failed. Non-fatal to the run, surfaced as a
    /// partial-success warning so results are not silently lost.
    #[error("result sink write failed: {0}")]
    SinkWrite(String),

    #[error("config error: {0}")]
    Config(String),

    /// Requested engine was not compiled into this build.
    #[error("engine '{0}' is not compiled into this build")]
    Unsupported(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ────────────────────────────────────────────────────────────────────────────────
// Canonical workload operations
// ────────────────────────────────────────────────────────────────────────────────

/// The five engine-agnostic workload intents. Variants define *intent*, not
/// mechanism; each adapter documents its realization via [`Capabilities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkloadOperation {
    ReadIntensive,
    WriteIntensive,
    Indexing,
    Aggregation,
    Mixed,
}

impl WorkloadOperation {
    /// Fixed execution order for every run.
    pub const ALL: [WorkloadOperation; 5] = [
        WorkloadOperation::ReadIntensive,
        WorkloadOperation::WriteIntensive,
        WorkloadOperation::Indexing,
        WorkloadOperation::Aggregation,
        WorkloadOperation::Mixed,
    ];

    /// Label used in the result log. These strings are shared with result
    /// files produced by earlier harness versions and must not change.
    pub fn label(&self) -> &'static str {
        match self {
            WorkloadOperation::ReadIntensive => "Read-Intensive",
            WorkloadOperation::WriteIntensive => "Write-Intensive",
            WorkloadOperation::Indexing => "Indexing",
            WorkloadOperation::Aggregation => "Aggregation",
            WorkloadOperation::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for WorkloadOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Measurement record
// ────────────────────────────────────────────────────────────────────────────────

/// One logged observation of duration + resource usage for one operation in
/// one run. Immutable once created; appended to the sink, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct MeasurementRecord {
    /// Wall-clock timestamp (UTC) taken when the operation started.
    pub timestamp: String,
    pub operation: WorkloadOperation,
    /// Always >= 0. Failed operations produce no record at all.
    pub duration_seconds: f64,
    /// System CPU percent sampled once after completion. May exceed 100 on
    /// multi-core samples.
    pub cpu_percent: f64,
    /// Used system memory in MB sampled once after completion.
    pub memory_mb: f64,
    /// Skipped sub-steps, declared fallbacks, or other adapter remarks.
    pub notes: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────────
// Dataset fixture
// ────────────────────────────────────────────────────────────────────────────────

/// The canonical seed row used to populate the working table/collection
/// before timed operations begin. Every adapter materializes the same
/// logical fixture (same field set, same row count) so timings stay
/// comparable across engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetFixture {
    pub reviewer_id: String,
    pub asin: String,
    pub review_text: String,
    /// Review score, 1..=5. Low cardinality; the Aggregation and Indexing
    /// operations key on this column.
    pub overall: i64,
    pub summary: String,
    /// Epoch seconds.
    pub unix_review_time: i64,
}

impl Default for DatasetFixture {
    fn default() -> Self {
        Self {
            reviewer_id: "A2SUAM1J3GNN3B".to_string(),
            asin: "0000013714".to_string(),
            review_text: "Great book for kids.".to_string(),
            overall: 5,
            summary: "Good".to_string(),
            unix_review_time: 1_382_659_200,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Workload parameters
// ────────────────────────────────────────────────────────────────────────────────

/// Fixed iteration counts for the workload. No scaling model beyond these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkloadParams {
    /// Fixture rows inserted during the load phase.
    pub rows: usize,
    /// Sequential single-row inserts for WriteIntensive.
    pub write_burst: usize,
    /// Disposable tagged rows for the Mixed insert sub-step.
    pub mixed_rows: usize,
}

impl Default for WorkloadParams {
    fn default() -> Self {
        Self {
            rows: 10_000,
            write_burst: 1_000,
            mixed_rows: 500,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Adapter capabilities
// ────────────────────────────────────────────────────────────────────────────────

/// How an engine realizes the Indexing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndexingStyle {
    /// Creates a real secondary index on a non-key column.
    SecondaryIndex,
    /// No user-defined secondary indexes; the adapter runs a filtered scan
    /// as the closest analogous operation and says so in the record notes.
    FilteredScan,
}

impl fmt::Display for IndexingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexingStyle::SecondaryIndex => f.write_str("secondary index"),
            IndexingStyle::FilteredScan => f.write_str("filtered scan (fallback)"),
        }
    }
}

/// Static per-adapter metadata declaring which canonical sub-steps the
/// engine supports. The driver never fails a run over a declared no-op, but
/// the result record notes which sub-steps actually ran.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Capabilities {
    pub indexing: IndexingStyle,
    pub mixed_insert: bool,
    pub mixed_point_read: bool,
    pub mixed_update: bool,
    pub mixed_delete: bool,
}

impl Capabilities {
    /// Full CRUD support with a real secondary index.
    pub const FULL: Capabilities = Capabilities {
        indexing: IndexingStyle::SecondaryIndex,
        mixed_insert: true,
        mixed_point_read: true,
        mixed_update: true,
        mixed_delete: true,
    };

    /// Mixed sub-steps this engine skips, in canonical order.
    pub fn skipped_substeps(&self) -> Vec<&'static str> {
        let mut skipped = Vec::new();
        if !self.mixed_insert {
            skipped.push("insert");
        }
        if !self.mixed_point_read {
            skipped.push("point_read");
        }
        if !self.mixed_update {
            skipped.push("update");
        }
        if !self.mixed_delete {
            skipped.push("delete");
        }
        skipped
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Execution outcome
// ────────────────────────────────────────────────────────────────────────────────

/// Opaque success signal from [`EngineAdapter::execute`]. Carries only
/// adapter remarks; never rows. The harness asserts on timing, not data.
#[derive(Debug, Clone, Default)]
pub struct ExecOutcome {
    pub notes: Option<String>,
}

impl ExecOutcome {
    pub fn clean() -> Self {
        Self { notes: None }
    }

    pub fn noted(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// EngineAdapter trait — every engine implements this
// ────────────────────────────────────────────────────────────────────────────────

/// Engine-specific realization of the canonical workload contract.
///
/// An adapter owns exactly one live session to its target engine, created at
/// harness start and released by `teardown` on every exit path. Sessions are
/// never shared across runs.
pub trait EngineAdapter: Send {
    fn name(&self) -> &str;

    /// Static capability metadata for this engine.
    fn capabilities(&self) -> Capabilities;

    /// Idempotently (re)creates a clean working table/collection, dropping
    /// any pre-existing one with the same identity.
    fn setup(&mut self) -> HarnessResult<()>;

    /// Inserts `count` copies of `fixture` as the baseline dataset, as a
    /// single bulk operation where the engine supports it. Partial writes
    /// are not rolled back here; the error reports how many rows committed.
    fn load(&mut self, fixture: &DatasetFixture, count: usize) -> HarnessResult<()>;

    /// Performs the engine-specific realization of one canonical operation.
    fn execute(
        &mut self,
        op: WorkloadOperation,
        params: &WorkloadParams,
    ) -> HarnessResult<ExecOutcome>;

    /// Releases the session. Called exactly once per run, including on
    /// error paths.
    fn teardown(&mut self) -> HarnessResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_order_is_fixed() {
        let labels: Vec<&str> = WorkloadOperation::ALL.iter().map(|op| op.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Read-Intensive",
                "Write-Intensive",
                "Indexing",
                "Aggregation",
                "Mixed"
            ]
        );
    }

    #[test]
    fn full_capabilities_skip_nothing() {
        assert!(Capabilities::FULL.skipped_substeps().is_empty());
    }

    #[test]
    fn partial_capabilities_report_skips_in_order() {
        let caps = Capabilities {
            indexing: IndexingStyle::SecondaryIndex,
            mixed_insert: true,
            mixed_point_read: true,
            mixed_update: false,
            mixed_delete: false,
        };
        assert_eq!(caps.skipped_substeps(), vec!["update", "delete"]);
    }

    #[test]
    fn fixture_default_matches_canonical_row() {
        let fixture = DatasetFixture::default();
        assert_eq!(fixture.reviewer_id, "A2SUAM1J3GNN3B");
        assert_eq!(fixture.overall, 5);
        assert_eq!(fixture.unix_review_time, 1_382_659_200);
    }
}
