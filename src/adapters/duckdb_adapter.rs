//! DuckDB adapter.
//!
//! DuckDB has no user-defined secondary indexes in the sense the Indexing
//! operation measures, so the adapter declares the filtered-scan fallback
//! and notes it on every Indexing record.

use crate::{
    Capabilities, DatasetFixture, EngineAdapter, ExecOutcome, HarnessError, HarnessResult,
    IndexingStyle, WorkloadOperation, WorkloadParams,
};
use duckdb::{params, Connection};
use std::path::Path;

pub const CAPABILITIES: Capabilities = Capabilities {
    indexing: IndexingStyle::FilteredScan,
    mixed_insert: true,
    mixed_point_read: true,
    mixed_update: true,
    mixed_delete: true,
};

pub struct DuckDbAdapter {
    conn: Connection,
}

impl DuckDbAdapter {
    pub fn open(path: &Path) -> HarnessResult<Self> {
        let conn = Connection::open(path).map_err(|e| HarnessError::Engine {
            engine: "duckdb".into(),
            message: format!("open {}: {}", path.display(), e),
        })?;
        Ok(Self { conn })
    }

    fn engine_err(&self, context: &str, e: impl std::fmt::Display) -> HarnessError {
        HarnessError::Engine {
            engine: "duckdb".into(),
            message: format!("{}: {}", context, e),
        }
    }
}

impl EngineAdapter for DuckDbAdapter {
    fn name(&self) -> &str {
        "duckdb"
    }

    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn setup(&mut self) -> HarnessResult<()> {
        self.conn
            .execute_batch(
                "DROP TABLE IF EXISTS reviews;
                 CREATE TABLE reviews (
                    reviewer_id      VARCHAR,
                    asin             VARCHAR,
                    review_text      VARCHAR,
                    overall          INTEGER,
                    summary          VARCHAR,
                    unix_review_time BIGINT
                 );",
            )
            .map_err(|e| HarnessError::Schema {
                engine: "duckdb".into(),
                message: e.to_string(),
            })
    }

    fn load(&mut self, fixture: &DatasetFixture, count: usize) -> HarnessResult<()> {
        let load_err = |e: &dyn std::fmt::Display| HarnessError::Load {
            engine: "duckdb".into(),
            committed: 0,
            message: e.to_string(),
        };

        let tx = self.conn.transaction().map_err(|e| load_err(&e))?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO reviews VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .map_err(|e| load_err(&e))?;
            for _ in 0..count {
                stmt.execute(params![
                    fixture.reviewer_id,
                    fixture.asin,
                    fixture.review_text,
                    fixture.overall,
                    fixture.summary,
                    fixture.unix_review_time
                ])
                .map_err(|e| load_err(&e))?;
            }
        }
        tx.commit().map_err(|e| load_err(&e))
    }

    fn execute(
        &mut self,
        op: WorkloadOperation,
        params_cfg: &WorkloadParams,
    ) -> HarnessResult<ExecOutcome> {
        match op {
            WorkloadOperation::ReadIntensive => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT COUNT(*) FROM reviews")
                    .map_err(|e| self.engine_err("prepare count", e))?;
                let _count: i64 = stmt
                    .query_row([], |row| row.get(0))
                    .map_err(|e| self.engine_err("count", e))?;
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::WriteIntensive => {
                let tx = self
                    .conn
                    .transaction()
                    .map_err(|e| HarnessError::Engine {
                        engine: "duckdb".into(),
                        message: format!("begin burst: {}", e),
                    })?;
                {
                    let mut stmt = tx
                        .prepare(
                            "INSERT INTO reviews VALUES
                             ('TEST', 'TEST', 'Write test.', 4, 'Test', 1234567890)",
                        )
                        .map_err(|e| HarnessError::Engine {
                            engine: "duckdb".into(),
                            message: format!("prepare burst: {}", e),
                        })?;
                    for _ in 0..params_cfg.write_burst {
                        stmt.execute([]).map_err(|e| HarnessError::Engine {
                            engine: "duckdb".into(),
                            message: format!("burst insert: {}", e),
                        })?;
                    }
                }
                tx.commit().map_err(|e| HarnessError::Engine {
                    engine: "duckdb".into(),
                    message: format!("commit burst: {}", e),
                })?;
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::Indexing => {
                // Closest analogous operation: a scan filtered on the column
                // a secondary index would cover.
                let mut stmt = self
                    .conn
                    .prepare("SELECT COUNT(*) FROM reviews WHERE overall = 5")
                    .map_err(|e| self.engine_err("prepare filtered scan", e))?;
                let _count: i64 = stmt
                    .query_row([], |row| row.get(0))
                    .map_err(|e| self.engine_err("filtered scan", e))?;
                Ok(ExecOutcome::noted(
                    "indexing fallback: filtered scan (no user-defined secondary indexes)",
                ))
            }
            WorkloadOperation::Aggregation => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT overall, COUNT(*) FROM reviews GROUP BY overall")
                    .map_err(|e| self.engine_err("prepare group", e))?;
                let mut rows = stmt.query([]).map_err(|e| self.engine_err("group", e))?;
                while let Some(row) = rows.next().map_err(|e| self.engine_err("group next", e))? {
                    let _overall: i32 = row.get(0).map_err(|e| self.engine_err("group col", e))?;
                    let _count: i64 = row.get(1).map_err(|e| self.engine_err("group col", e))?;
                }
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::Mixed => {
                let tx = self
                    .conn
                    .transaction()
                    .map_err(|e| HarnessError::Engine {
                        engine: "duckdb".into(),
                        message: format!("begin mixed: {}", e),
                    })?;
                {
                    let mut insert = tx
                        .prepare(
                            "INSERT INTO reviews (reviewer_id, asin) VALUES ('mixed', 'mixed')",
                        )
                        .map_err(|e| HarnessError::Engine {
                            engine: "duckdb".into(),
                            message: format!("prepare mixed: {}", e),
                        })?;
                    for _ in 0..params_cfg.mixed_rows {
                        insert.execute([]).map_err(|e| HarnessError::Engine {
                            engine: "duckdb".into(),
                            message: format!("mixed insert: {}", e),
                        })?;
                    }
                }
                {
                    let mut point = tx
                        .prepare("SELECT asin FROM reviews WHERE reviewer_id = 'mixed' LIMIT 1")
                        .map_err(|e| HarnessError::Engine {
                            engine: "duckdb".into(),
                            message: format!("prepare point read: {}", e),
                        })?;
                    let mut rows = point.query([]).map_err(|e| HarnessError::Engine {
                        engine: "duckdb".into(),
                        message: format!("mixed point read: {}", e),
                    })?;
                    let _ = rows.next().map_err(|e| HarnessError::Engine {
                        engine: "duckdb".into(),
                        message: format!("mixed point read: {}", e),
                    })?;
                }
                tx.execute(
                    "UPDATE reviews SET summary = 'updated' WHERE reviewer_id = 'mixed'",
                    [],
                )
                .map_err(|e| HarnessError::Engine {
                    engine: "duckdb".into(),
                    message: format!("mixed update: {}", e),
                })?;
                tx.execute("DELETE FROM reviews WHERE reviewer_id = 'mixed'", [])
                    .map_err(|e| HarnessError::Engine {
                        engine: "duckdb".into(),
                        message: format!("mixed delete: {}", e),
                    })?;
                tx.commit().map_err(|e| HarnessError::Engine {
                    engine: "duckdb".into(),
                    message: format!("commit mixed: {}", e),
                })?;
                Ok(ExecOutcome::clean())
            }
        }
    }

    fn teardown(&mut self) -> HarnessResult<()> {
        let _ = self.conn.execute_batch("CHECKPOINT;");
        Ok(())
    }
}
