//! Cassandra/Scylla adapter (wide-column store).
//!
//! The driver is async, so the adapter owns a current-thread tokio runtime
//! and blocks on every call at the trait boundary; the harness surface stays
//! synchronous and the blocking call is the measurement.
//!
//! Capability notes: Cassandra cannot update or delete by a non-key column,
//! so the Mixed update/delete sub-steps are declared unsupported and appear
//! as skipped in the record notes. Grouped aggregation is also unavailable;
//! Aggregation runs a bounded projection scan instead.

use crate::{
    Capabilities, DatasetFixture, EngineAdapter, ExecOutcome, HarnessError, HarnessResult,
    IndexingStyle, WorkloadOperation, WorkloadParams,
};
use scylla::{Session, SessionBuilder};
use tokio::runtime::Runtime;
use uuid::Uuid;

pub const CAPABILITIES: Capabilities = Capabilities {
    indexing: IndexingStyle::SecondaryIndex,
    mixed_insert: true,
    mixed_point_read: true,
    mixed_update: false,
    mixed_delete: false,
};

const KEYSPACE: &str = "energytest";

pub struct CassandraAdapter {
    rt: Runtime,
    session: Session,
}

impl CassandraAdapter {
    pub fn open(node: &str) -> HarnessResult<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(HarnessError::Io)?;
        let session = rt
            .block_on(SessionBuilder::new().known_node(node).build())
            .map_err(|e| HarnessError::Engine {
                engine: "cassandra".into(),
                message: format!("connect {}: {}", node, e),
            })?;
        Ok(Self { rt, session })
    }

    fn query(&self, context: &str, cql: &str) -> HarnessResult<()> {
        self.rt
            .block_on(self.session.query(cql, ()))
            .map(|_| ())
            .map_err(|e| HarnessError::Engine {
                engine: "cassandra".into(),
                message: format!("{}: {}", context, e),
            })
    }
}

impl EngineAdapter for CassandraAdapter {
    fn name(&self) -> &str {
        "cassandra"
    }

    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn setup(&mut self) -> HarnessResult<()> {
        let schema_err = |e: HarnessError| HarnessError::Schema {
            engine: "cassandra".into(),
            message: e.to_string(),
        };

        self.query("drop keyspace", &format!("DROP KEYSPACE IF EXISTS {}", KEYSPACE))
            .map_err(schema_err)?;
        self.query(
            "create keyspace",
            &format!(
                "CREATE KEYSPACE {} WITH replication = \
                 {{ 'class': 'SimpleStrategy', 'replication_factor': '1' }}",
                KEYSPACE
            ),
        )
        .map_err(schema_err)?;
        self.rt
            .block_on(self.session.use_keyspace(KEYSPACE, false))
            .map_err(|e| HarnessError::Schema {
                engine: "cassandra".into(),
                message: format!("use keyspace: {}", e),
            })?;
        self.query(
            "create table",
            "CREATE TABLE reviews (
                id               uuid PRIMARY KEY,
                reviewer_id      text,
                asin             text,
                review_text      text,
                overall          int,
                summary          text,
                unix_review_time bigint
             )",
        )
        .map_err(schema_err)
    }

    fn load(&mut self, fixture: &DatasetFixture, count: usize) -> HarnessResult<()> {
        let prepared = self
            .rt
            .block_on(self.session.prepare(
                "INSERT INTO reviews
                 (id, reviewer_id, asin, review_text, overall, summary, unix_review_time)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            ))
            .map_err(|e| HarnessError::Load {
                engine: "cassandra".into(),
                committed: 0,
                message: format!("prepare: {}", e),
            })?;

        for committed in 0..count {
            self.rt
                .block_on(self.session.execute(
                    &prepared,
                    (
                        Uuid::new_v4(),
                        fixture.reviewer_id.as_str(),
                        fixture.asin.as_str(),
                        fixture.review_text.as_str(),
                        fixture.overall as i32,
                        fixture.summary.as_str(),
                        fixture.unix_review_time,
                    ),
                ))
                .map_err(|e| HarnessError::Load {
                    engine: "cassandra".into(),
                    committed,
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }

    fn execute(
        &mut self,
        op: WorkloadOperation,
        params: &WorkloadParams,
    ) -> HarnessResult<ExecOutcome> {
        match op {
            WorkloadOperation::ReadIntensive => {
                self.query("count", "SELECT COUNT(*) FROM reviews")?;
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::WriteIntensive => {
                let prepared = self
                    .rt
                    .block_on(self.session.prepare(
                        "INSERT INTO reviews
                         (id, reviewer_id, asin, review_text, overall, summary, unix_review_time)
                         VALUES (?, 'TEST', 'TEST', 'Write test.', 4, 'Test', 1234567890)",
                    ))
                    .map_err(|e| HarnessError::Engine {
                        engine: "cassandra".into(),
                        message: format!("prepare burst: {}", e),
                    })?;
                for _ in 0..params.write_burst {
                    self.rt
                        .block_on(self.session.execute(&prepared, (Uuid::new_v4(),)))
                        .map_err(|e| HarnessError::Engine {
                            engine: "cassandra".into(),
                            message: format!("burst insert: {}", e),
                        })?;
                }
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::Indexing => {
                self.query(
                    "create index",
                    "CREATE INDEX IF NOT EXISTS ON reviews (overall)",
                )?;
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::Aggregation => {
                // No grouped aggregation; a bounded projection scan is the
                // nearest supported approximation.
                self.query("projection scan", "SELECT overall FROM reviews LIMIT 1000")?;
                Ok(ExecOutcome::noted(
                    "aggregation fallback: bounded projection scan (no GROUP BY)",
                ))
            }
            WorkloadOperation::Mixed => {
                let prepared = self
                    .rt
                    .block_on(self.session.prepare(
                        "INSERT INTO reviews (id, reviewer_id, asin) VALUES (?, 'mixed', 'mixed')",
                    ))
                    .map_err(|e| HarnessError::Engine {
                        engine: "cassandra".into(),
                        message: format!("prepare mixed: {}", e),
                    })?;
                let mut last_id = None;
                for _ in 0..params.mixed_rows {
                    let id = Uuid::new_v4();
                    self.rt
                        .block_on(self.session.execute(&prepared, (id,)))
                        .map_err(|e| HarnessError::Engine {
                            engine: "cassandra".into(),
                            message: format!("mixed insert: {}", e),
                        })?;
                    last_id = Some(id);
                }
                if let Some(id) = last_id {
                    // Point read by primary key.
                    self.rt
                        .block_on(
                            self.session
                                .query("SELECT asin FROM reviews WHERE id = ?", (id,)),
                        )
                        .map_err(|e| HarnessError::Engine {
                            engine: "cassandra".into(),
                            message: format!("mixed point read: {}", e),
                        })?;
                }
                let skipped = self.capabilities().skipped_substeps();
                Ok(ExecOutcome::noted(format!(
                    "skipped sub-steps: {}",
                    skipped.join(", ")
                )))
            }
        }
    }

    fn teardown(&mut self) -> HarnessResult<()> {
        // Dropping the session closes the cluster connections.
        Ok(())
    }
}
