//! MySQL adapter.
//!
//! Talks to a live server; the endpoint comes from
//! [`crate::config::EndpointConfig::mysql_url`] and must name an existing
//! database the connecting user can create tables in.

use crate::{
    Capabilities, DatasetFixture, EngineAdapter, ExecOutcome, HarnessError, HarnessResult,
    WorkloadOperation, WorkloadParams,
};
use mysql::prelude::Queryable;
use mysql::{params, Conn, Opts};

pub const CAPABILITIES: Capabilities = Capabilities::FULL;

pub struct MysqlAdapter {
    conn: Conn,
}

impl MysqlAdapter {
    pub fn open(url: &str) -> HarnessResult<Self> {
        let opts = Opts::from_url(url).map_err(|e| HarnessError::Config(format!(
            "mysql url: {}",
            e
        )))?;
        let conn = Conn::new(opts).map_err(|e| HarnessError::Engine {
            engine: "mysql".into(),
            message: format!("connect: {}", e),
        })?;
        Ok(Self { conn })
    }

    fn engine_err(context: &str, e: impl std::fmt::Display) -> HarnessError {
        HarnessError::Engine {
            engine: "mysql".into(),
            message: format!("{}: {}", context, e),
        }
    }
}

impl EngineAdapter for MysqlAdapter {
    fn name(&self) -> &str {
        "mysql"
    }

    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn setup(&mut self) -> HarnessResult<()> {
        self.conn
            .query_drop("DROP TABLE IF EXISTS reviews")
            .and_then(|_| {
                self.conn.query_drop(
                    "CREATE TABLE reviews (
                        reviewer_id      VARCHAR(255),
                        asin             VARCHAR(255),
                        review_text      TEXT,
                        overall          INT,
                        summary          VARCHAR(255),
                        unix_review_time BIGINT
                     )",
                )
            })
            .map_err(|e| HarnessError::Schema {
                engine: "mysql".into(),
                message: e.to_string(),
            })
    }

    fn load(&mut self, fixture: &DatasetFixture, count: usize) -> HarnessResult<()> {
        self.conn
            .exec_batch(
                "INSERT INTO reviews
                 (reviewer_id, asin, review_text, overall, summary, unix_review_time)
                 VALUES (:reviewer_id, :asin, :review_text, :overall, :summary, :unix_review_time)",
                (0..count).map(|_| {
                    params! {
                        "reviewer_id" => &fixture.reviewer_id,
                        "asin" => &fixture.asin,
                        "review_text" => &fixture.review_text,
                        "overall" => fixture.overall,
                        "summary" => &fixture.summary,
                        "unix_review_time" => fixture.unix_review_time,
                    }
                }),
            )
            .map_err(|e| HarnessError::Load {
                engine: "mysql".into(),
                committed: 0,
                message: e.to_string(),
            })
    }

    fn execute(
        &mut self,
        op: WorkloadOperation,
        params_cfg: &WorkloadParams,
    ) -> HarnessResult<ExecOutcome> {
        match op {
            WorkloadOperation::ReadIntensive => {
                let _count: Option<i64> = self
                    .conn
                    .query_first("SELECT COUNT(*) FROM reviews")
                    .map_err(|e| Self::engine_err("count", e))?;
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::WriteIntensive => {
                let stmt = self
                    .conn
                    .prep(
                        "INSERT INTO reviews
                         (reviewer_id, asin, review_text, overall, summary, unix_review_time)
                         VALUES ('TEST', 'TEST', 'Write test.', 4, 'Test', 1234567890)",
                    )
                    .map_err(|e| Self::engine_err("prepare burst", e))?;
                for _ in 0..params_cfg.write_burst {
                    self.conn
                        .exec_drop(&stmt, ())
                        .map_err(|e| Self::engine_err("burst insert", e))?;
                }
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::Indexing => {
                // Setup dropped the table, so the index name is free again.
                self.conn
                    .query_drop("CREATE INDEX idx_reviews_overall ON reviews(overall)")
                    .map_err(|e| Self::engine_err("create index", e))?;
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::Aggregation => {
                let _groups: Vec<(i64, i64)> = self
                    .conn
                    .query("SELECT overall, COUNT(*) FROM reviews GROUP BY overall")
                    .map_err(|e| Self::engine_err("group", e))?;
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::Mixed => {
                for _ in 0..params_cfg.mixed_rows {
                    self.conn
                        .query_drop(
                            "INSERT INTO reviews (reviewer_id, asin) VALUES ('mixed', 'mixed')",
                        )
                        .map_err(|e| Self::engine_err("mixed insert", e))?;
                }
                let _row: Option<String> = self
                    .conn
                    .query_first("SELECT asin FROM reviews WHERE reviewer_id = 'mixed' LIMIT 1")
                    .map_err(|e| Self::engine_err("mixed point read", e))?;
                self.conn
                    .query_drop("UPDATE reviews SET summary = 'updated' WHERE reviewer_id = 'mixed'")
                    .map_err(|e| Self::engine_err("mixed update", e))?;
                self.conn
                    .query_drop("DELETE FROM reviews WHERE reviewer_id = 'mixed'")
                    .map_err(|e| Self::engine_err("mixed delete", e))?;
                Ok(ExecOutcome::clean())
            }
        }
    }

    fn teardown(&mut self) -> HarnessResult<()> {
        // Dropping the connection closes the session; nothing to flush.
        Ok(())
    }
}
