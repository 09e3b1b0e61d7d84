//! MongoDB adapter (document store), using the driver's blocking API so the
//! harness surface stays synchronous.

use crate::{
    Capabilities, DatasetFixture, EngineAdapter, ExecOutcome, HarnessError, HarnessResult,
    WorkloadOperation, WorkloadParams,
};
use mongodb::bson::{doc, Document};
use mongodb::sync::{Client, Collection};
use mongodb::IndexModel;

pub const CAPABILITIES: Capabilities = Capabilities::FULL;

const DB_NAME: &str = "energy_test_db";
const COLLECTION: &str = "reviews";

pub struct MongoAdapter {
    // The client owns the connection pool; kept for the session's lifetime.
    _client: Client,
    coll: Collection<Document>,
}

impl MongoAdapter {
    pub fn open(uri: &str) -> HarnessResult<Self> {
        let client = Client::with_uri_str(uri).map_err(|e| HarnessError::Engine {
            engine: "mongodb".into(),
            message: format!("connect: {}", e),
        })?;
        let coll = client.database(DB_NAME).collection::<Document>(COLLECTION);
        Ok(Self {
            _client: client,
            coll,
        })
    }

    fn engine_err(context: &str, e: impl std::fmt::Display) -> HarnessError {
        HarnessError::Engine {
            engine: "mongodb".into(),
            message: format!("{}: {}", context, e),
        }
    }

    fn fixture_doc(fixture: &DatasetFixture) -> Document {
        doc! {
            "reviewerID": &fixture.reviewer_id,
            "asin": &fixture.asin,
            "reviewText": &fixture.review_text,
            "overall": fixture.overall,
            "summary": &fixture.summary,
            "unixReviewTime": fixture.unix_review_time,
        }
    }
}

impl EngineAdapter for MongoAdapter {
    fn name(&self) -> &str {
        "mongodb"
    }

    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn setup(&mut self) -> HarnessResult<()> {
        // Dropping the collection clears data and indexes in one step.
        self.coll.drop(None).map_err(|e| HarnessError::Schema {
            engine: "mongodb".into(),
            message: e.to_string(),
        })
    }

    fn load(&mut self, fixture: &DatasetFixture, count: usize) -> HarnessResult<()> {
        let docs: Vec<Document> = (0..count).map(|_| Self::fixture_doc(fixture)).collect();
        match self.coll.insert_many(docs, None) {
            Ok(result) if result.inserted_ids.len() == count => Ok(()),
            Ok(result) => Err(HarnessError::Load {
                engine: "mongodb".into(),
                committed: result.inserted_ids.len(),
                message: format!("expected {} inserts", count),
            }),
            Err(e) => Err(HarnessError::Load {
                engine: "mongodb".into(),
                committed: 0,
                message: e.to_string(),
            }),
        }
    }

    fn execute(
        &mut self,
        op: WorkloadOperation,
        params: &WorkloadParams,
    ) -> HarnessResult<ExecOutcome> {
        match op {
            WorkloadOperation::ReadIntensive => {
                self.coll
                    .count_documents(doc! {}, None)
                    .map_err(|e| Self::engine_err("count", e))?;
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::WriteIntensive => {
                for _ in 0..params.write_burst {
                    self.coll
                        .insert_one(
                            doc! {
                                "reviewerID": "TEST",
                                "asin": "TEST",
                                "reviewText": "Write test.",
                                "overall": 4i64,
                            },
                            None,
                        )
                        .map_err(|e| Self::engine_err("burst insert", e))?;
                }
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::Indexing => {
                let model = IndexModel::builder().keys(doc! { "overall": 1 }).build();
                self.coll
                    .create_index(model, None)
                    .map_err(|e| Self::engine_err("create index", e))?;
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::Aggregation => {
                let cursor = self
                    .coll
                    .aggregate(
                        [doc! { "$group": { "_id": "$overall", "count": { "$sum": 1 } } }],
                        None,
                    )
                    .map_err(|e| Self::engine_err("aggregate", e))?;
                for result in cursor {
                    result.map_err(|e| Self::engine_err("aggregate cursor", e))?;
                }
                Ok(ExecOutcome::clean())
            }
            WorkloadOperation::Mixed => {
                for _ in 0..params.mixed_rows {
                    self.coll
                        .insert_one(doc! { "reviewerID": "mixed", "mixed": true }, None)
                        .map_err(|e| Self::engine_err("mixed insert", e))?;
                }
                self.coll
                    .find_one(doc! { "reviewerID": "mixed" }, None)
                    .map_err(|e| Self::engine_err("mixed point read", e))?;
                self.coll
                    .update_many(
                        doc! { "mixed": true },
                        doc! { "$set": { "updated": true } },
                        None,
                    )
                    .map_err(|e| Self::engine_err("mixed update", e))?;
                self.coll
                    .delete_many(doc! { "mixed": true }, None)
                    .map_err(|e| Self::engine_err("mixed delete", e))?;
                Ok(ExecOutcome::clean())
            }
        }
    }

    fn teardown(&mut self) -> HarnessResult<()> {
        // Dropping the client shuts the pool down.
        Ok(())
    }
}
