//! Delivery to the destination store: one [`Sink`] trait, two shapes.
//!
//! The append sink pushes the whole record set to the reporting-sheet
//! endpoint in a single request. The upsert sink stages one keyed merge per
//! record and commits them in batches under the document store's write
//! ceiling. Only the upsert path is idempotent.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::transform::ProjectedRecord;
use crate::{SyncError, SyncResult};

/// Destination limit on operations per write batch.
pub const MAX_BATCH_OPS: usize = 500;

/// Field the store stamps with its own clock on every write.
pub const SYNCED_AT_FIELD: &str = "synced_at";

/// What a delivery did, for run reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Records actually written.
    pub written: usize,
    /// Records skipped for lacking a natural key.
    pub skipped: usize,
    /// Write batches submitted.
    pub batches: usize,
}

#[async_trait]
pub trait Sink: Send + Sync {
    /// Deliver one run's records. Empty input must be a no-op with zero
    /// writes attempted.
    async fn deliver(&self, records: &[ProjectedRecord]) -> SyncResult<DeliveryReport>;
}

/// Whole-batch append to the reporting-sheet endpoint.
pub struct AppendSink {
    client: Client,
    url: String,
}

impl AppendSink {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

#[derive(Serialize)]
struct AppendBody<'a> {
    values: Vec<Vec<&'a str>>,
}

#[async_trait]
impl Sink for AppendSink {
    async fn deliver(&self, records: &[ProjectedRecord]) -> SyncResult<DeliveryReport> {
        if records.is_empty() {
            return Ok(DeliveryReport::default());
        }
        let values: Vec<Vec<&str>> = records.iter().map(|r| r.values().collect()).collect();
        let response = self
            .client
            .post(&self.url)
            .json(&AppendBody { values })
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Rejected {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }
        Ok(DeliveryReport {
            written: records.len(),
            skipped: 0,
            batches: 1,
        })
    }
}

/// Keyed upsert into the document store.
///
/// Each record becomes a merge write addressed by its trip id, with the
/// update mask limited to the record's own fields and a server-time
/// transform on [`SYNCED_AT_FIELD`]. Re-delivering the same export leaves
/// the store unchanged.
pub struct UpsertSink {
    client: Client,
    endpoint: String,
    project_id: String,
    collection: String,
    token: String,
}

impl UpsertSink {
    pub fn new(endpoint: String, project_id: String, collection: String, token: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            project_id,
            collection,
            token,
        }
    }

    /// Stage commit bodies for every keyed record, chunked under
    /// [`MAX_BATCH_OPS`]. Records without a trip id are dropped here; they
    /// cannot be deduplicated and do not fail the run.
    pub fn plan_commits(&self, records: &[ProjectedRecord]) -> Vec<CommitBody> {
        let keyed: Vec<&ProjectedRecord> = records
            .iter()
            .filter(|record| !record.trip_id().is_empty())
            .collect();
        keyed
            .chunks(MAX_BATCH_OPS)
            .map(|chunk| CommitBody {
                writes: chunk.iter().map(|record| self.stage_write(record)).collect(),
            })
            .collect()
    }

    fn stage_write(&self, record: &ProjectedRecord) -> Write {
        let fields: BTreeMap<&'static str, TypedValue> = record
            .fields()
            .map(|(name, value)| {
                (
                    name,
                    TypedValue {
                        string_value: value.to_string(),
                    },
                )
            })
            .collect();
        Write {
            update: Document {
                name: format!(
                    "projects/{}/databases/(default)/documents/{}/{}",
                    self.project_id,
                    self.collection,
                    record.trip_id()
                ),
                fields,
            },
            update_mask: FieldMask {
                field_paths: record.fields().map(|(name, _)| name).collect(),
            },
            update_transforms: vec![FieldTransform {
                field_path: SYNCED_AT_FIELD,
                set_to_server_value: "REQUEST_TIME",
            }],
        }
    }

    async fn commit(&self, body: &CommitBody) -> SyncResult<()> {
        let url = format!(
            "{}/projects/{}/databases/(default)/documents:commit",
            self.endpoint, self.project_id
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Rejected {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Sink for UpsertSink {
    async fn deliver(&self, records: &[ProjectedRecord]) -> SyncResult<DeliveryReport> {
        if records.is_empty() {
            return Ok(DeliveryReport::default());
        }
        let commits = self.plan_commits(records);
        let written: usize = commits.iter().map(|c| c.writes.len()).sum();
        let batches = commits.len();
        // All batches for the run must land; the first failure aborts the
        // remainder and fails the run even if earlier batches committed.
        for (index, body) in commits.iter().enumerate() {
            debug!(batch = index + 1, writes = body.writes.len(), "committing batch");
            self.commit(body).await?;
        }
        Ok(DeliveryReport {
            written,
            skipped: records.len() - written,
            batches,
        })
    }
}

/// Wire types for the document-store commit call.
#[derive(Debug, Serialize)]
pub struct CommitBody {
    pub writes: Vec<Write>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    pub update: Document,
    pub update_mask: FieldMask,
    pub update_transforms: Vec<FieldTransform>,
}

#[derive(Debug, Serialize)]
pub struct Document {
    /// Full resource name; the last path segment is the trip id.
    pub name: String,
    pub fields: BTreeMap<&'static str, TypedValue>,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TypedValue {
    pub string_value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMask {
    pub field_paths: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    pub field_path: &'static str,
    pub set_to_server_value: &'static str,
}
