//! SQLite adapter (via rusqlite).
//!
//! Configuration: WAL mode, NORMAL synchronous. Full capability set: real
//! secondary index, and every Mixed sub-step runs natively.

use crate::{
    Capabilities, DatasetFixture, EngineAdapter, ExecOutcome, HarnessError, HarnessResult,
    WorkloadOperation, WorkloadParams,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

pub const CAPABILITIES: Capabilities = Capabilities::FULL;

pub struct SqliteAdapter {
    conn: Connection,
}

impl SqliteAdapter {
    pub fn open(path: &Path) -> HarnessResult<Self> {
        let conn = Connection::open(path).map_err(|e| HarnessError::Engine {
            engine: "sqlite".into(),
            message: format!("open {}: {}", path.display(), e),
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| HarnessError::Engine {
            engine: "sqlite".into(),
            message: format!("pragma: {}", e),
        })?;

        Ok(Self { conn })
    }

    fn engine_err(&self, context: &str, e: impl std::fmt::Display) -> HarnessError {
        HarnessError::Engine {
            engine: "sqlite".into(),
            message: format!("{}: {}", context, e),
        }
    }
}

impl EngineAdapter for SqliteAdapter {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn setup(&mut self) -> HarnessResult<()> {
        self.conn
            .execute_batch(
                "DROP TABLE IF EXISTS reviews;
                 CREATE TABLE reviews (
                    reviewer_id      TEXT,
                    asin             TEXT,
                    review_text      TEXT,
                    overall          INTEGER,
                    summary          TEXT,
                    unix_review_time INTEGER
                 );",
            )
            .map_err(|e| HarnessError::Schema {
                engine: "sqlite".into(),
                message: e.to_string(),
            })
    }

    fn load(&mut self, fixture: &DatasetFixture, count: usize) -> HarnessResult<()> {
        let load_err = |committed: usize, e: &dyn std::fmt::Display| HarnessError::Load {
            engine: "sqlite".into(),
            committed,
            message: e.to_string(),
        };

        let tx = self
            .conn
            .transaction()
            .map_err(|e| load_err(0, &e))?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO reviews
                     (reviewer_id, asin, review_text, overall, summary, unix_review_time)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(|e| load_err(0, &e))?;
            for _ in 0..count {
                // Uncommitted rows roll back with the transaction.
                stmt.execute(params![
                    fixture.reviewer_id,
                    fixture.asin,
                    fixture.review_text,
                    fixture.overall,
                    fixture.summary,
                    fixture.unix_review_time
                ])
                .map_err(|e| load_err(0, &e))?;
            }
        }
        tx.commit().map_err(|e| load_err(0, &e))
    }

    fn execute(
        &mut self,
        op: WorkloadOperation,
        params_cfg: &WorkloadParams,
    ) -> HarnessResult<ExecOutcome> {
        match op {
            WorkloadOperation::ReadIntensive => {
                let _count: i64 = self
                    .conn
                    .prepare_cached("SELECT COUNT(*) FROM reviews")
                    .map_err(|e| self.engine_err("prepare count", e))?
                    .query_row([], |row| row.get(0))
                    .map_err(|e| self.engine_err("count", e))?;
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::WriteIntensive => {
                let tx = self
                    .conn
                    .transaction()
                    .map_err(|e| HarnessError::Engine {
                        engine: "sqlite".into(),
                        message: format!("begin burst: {}", e),
                    })?;
                {
                    let mut stmt = tx
                        .prepare_cached(
                            "INSERT INTO reviews
                             (reviewer_id, asin, review_text, overall, summary, unix_review_time)
                             VALUES ('TEST', 'TEST', 'Write test.', 4, 'Test', 1234567890)",
                        )
                        .map_err(|e| HarnessError::Engine {
                            engine: "sqlite".into(),
                            message: format!("prepare burst: {}", e),
                        })?;
                    for _ in 0..params_cfg.write_burst {
                        stmt.execute([]).map_err(|e| HarnessError::Engine {
                            engine: "sqlite".into(),
                            message: format!("burst insert: {}", e),
                        })?;
                    }
                }
                tx.commit().map_err(|e| HarnessError::Engine {
                    engine: "sqlite".into(),
                    message: format!("commit burst: {}", e),
                })?;
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::Indexing => {
                self.conn
                    .execute_batch(
                        "CREATE INDEX IF NOT EXISTS idx_reviews_overall ON reviews(overall)",
                    )
                    .map_err(|e| self.engine_err("create index", e))?;
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::Aggregation => {
                let mut stmt = self
                    .conn
                    .prepare_cached("SELECT overall, COUNT(*) FROM reviews GROUP BY overall")
                    .map_err(|e| self.engine_err("prepare group", e))?;
                let rows = stmt
                    .query_map([], |row| {
                        let overall: i64 = row.get(0)?;
                        let count: i64 = row.get(1)?;
                        Ok((overall, count))
                    })
                    .map_err(|e| self.engine_err("group", e))?;
                for row in rows {
                    row.map_err(|e| self.engine_err("group row", e))?;
                }
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::Mixed => {
                let tx = self
                    .conn
                    .transaction()
                    .map_err(|e| HarnessError::Engine {
                        engine: "sqlite".into(),
                        message: format!("begin mixed: {}", e),
                    })?;
                {
                    let mut insert = tx
                        .prepare_cached(
                            "INSERT INTO reviews (reviewer_id, asin) VALUES ('mixed', 'mixed')",
                        )
                        .map_err(|e| HarnessError::Engine {
                            engine: "sqlite".into(),
                            message: format!("prepare mixed: {}", e),
                        })?;
                    for _ in 0..params_cfg.mixed_rows {
                        insert.execute([]).map_err(|e| HarnessError::Engine {
                            engine: "sqlite".into(),
                            message: format!("mixed insert: {}", e),
                        })?;
                    }
                }
                let _row: Option<String> = tx
                    .query_row(
                        "SELECT asin FROM reviews WHERE reviewer_id = 'mixed' LIMIT 1",
                        [],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(|e| HarnessError::Engine {
                        engine: "sqlite".into(),
                        message: format!("mixed point read: {}", e),
                    })?;
                tx.execute(
                    "UPDATE reviews SET summary = 'updated' WHERE reviewer_id = 'mixed'",
                    [],
                )
                .map_err(|e| HarnessError::Engine {
                    engine: "sqlite".into(),
                    message: format!("mixed update: {}", e),
                })?;
                tx.execute("DELETE FROM reviews WHERE reviewer_id = 'mixed'", [])
                    .map_err(|e| HarnessError::Engine {
                        engine: "sqlite".into(),
                        message: format!("mixed delete: {}", e),
                    })?;
                tx.commit().map_err(|e| HarnessError::Engine {
                    engine: "sqlite".into(),
                    message: format!("commit mixed: {}", e),
                })?;
                Ok(ExecOutcome::clean())
            }
        }
    }

    fn teardown(&mut self) -> HarnessResult<()> {
        // Consolidate the WAL before the session drops.
        let _ = self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(dir: &Path) -> SqliteAdapter {
        SqliteAdapter::open(&dir.join("bench.sqlite3")).unwrap()
    }

    fn count_rows(db: &mut SqliteAdapter, filter: &str) -> i64 {
        db.conn
            .query_row(
                &format!("SELECT COUNT(*) FROM reviews WHERE {}", filter),
                [],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn setup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = adapter(dir.path());
        db.setup().unwrap();
        db.load(&DatasetFixture::default(), 5).unwrap();
        // A second setup recreates a clean table.
        db.setup().unwrap();
        assert_eq!(count_rows(&mut db, "1=1"), 0);
    }

    #[test]
    fn load_materializes_the_requested_row_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = adapter(dir.path());
        db.setup().unwrap();
        db.load(&DatasetFixture::default(), 250).unwrap();
        assert_eq!(count_rows(&mut db, "reviewer_id = 'A2SUAM1J3GNN3B'"), 250);
    }

    #[test]
    fn write_burst_adds_exactly_burst_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = adapter(dir.path());
        db.setup().unwrap();
        db.load(&DatasetFixture::default(), 100).unwrap();

        let params = WorkloadParams {
            rows: 100,
            write_burst: 40,
            mixed_rows: 10,
        };
        db.execute(WorkloadOperation::WriteIntensive, &params).unwrap();

        assert_eq!(count_rows(&mut db, "reviewer_id = 'TEST'"), 40);
        assert_eq!(count_rows(&mut db, "1=1"), 140);
    }

    #[test]
    fn mixed_disposable_rows_do_not_survive_the_operation() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = adapter(dir.path());
        db.setup().unwrap();
        db.load(&DatasetFixture::default(), 50).unwrap();

        let params = WorkloadParams {
            rows: 50,
            write_burst: 10,
            mixed_rows: 20,
        };
        db.execute(WorkloadOperation::Mixed, &params).unwrap();

        assert_eq!(count_rows(&mut db, "reviewer_id = 'mixed'"), 0);
        // The base fixture row count is untouched.
        assert_eq!(count_rows(&mut db, "1=1"), 50);
    }

    #[test]
    fn all_five_operations_succeed_on_a_loaded_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = adapter(dir.path());
        db.setup().unwrap();
        db.load(&DatasetFixture::default(), 100).unwrap();

        let params = WorkloadParams {
            rows: 100,
            write_burst: 10,
            mixed_rows: 5,
        };
        for op in WorkloadOperation::ALL {
            let outcome = db.execute(op, &params).unwrap();
            assert!(outcome.notes.is_none(), "{} produced notes", op);
        }
        db.teardown().unwrap();
    }
}
