//! Bulk-loaded destination and the write contract shared by every path.
//!
//! [`Destination`] is the raw collaborator (index existence, creation, bulk
//! request). [`BulkWriter`] wraps it with the accounting both the direct
//! migration and the queue replay rely on: one bulk request per batch,
//! transient transport failures retried, item-level failures logged and
//! reported back instead of aborting.

pub mod elasticsearch;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::retry::{with_retry, RetryConfig};
use crate::transform::BulkBatch;

pub use elasticsearch::{ElasticsearchConfig, ElasticsearchDestination};

/// Per-item result of a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItem {
    /// Document id.
    pub id: String,
    /// HTTP-like status for this item.
    pub status: u16,
    /// Error object, if the item failed.
    pub error: Option<Value>,
}

impl BulkItem {
    /// Whether the destination rejected this item.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error.is_some() || self.status >= 300
    }

    /// Human readable failure reason.
    #[must_use]
    pub fn reason(&self) -> String {
        match &self.error {
            Some(Value::Object(err)) => {
                let kind = err.get("type").and_then(Value::as_str).unwrap_or("error");
                match err.get("reason").and_then(Value::as_str) {
                    Some(reason) => format!("{}: {}", kind, reason),
                    None => kind.to_string(),
                }
            }
            Some(other) => other.to_string(),
            None => format!("status {}", self.status),
        }
    }
}

/// Response of a bulk request that was accepted as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkResponse {
    /// True if at least one item failed.
    pub errors: bool,
    /// Item results, in request order.
    pub items: Vec<BulkItem>,
}

/// A failed bulk item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    /// Document id.
    pub id: String,
    /// Item status.
    pub status: u16,
    /// Failure reason.
    pub reason: String,
}

/// Outcome of writing one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    /// Documents sent.
    pub attempted: u64,
    /// Documents rejected by the destination.
    pub failed: Vec<FailedItem>,
}

impl BulkOutcome {
    /// Documents written successfully.
    #[must_use]
    pub fn succeeded(&self) -> u64 {
        self.attempted.saturating_sub(self.failed.len() as u64)
    }
}

/// Bulk-loaded destination store.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Destination type name, for logs.
    fn destination_type(&self) -> &'static str;

    /// Whether the index exists.
    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Creates the index with the given settings/mappings body.
    async fn create_index(&self, index: &str, body: &Value) -> Result<()>;

    /// Sends one NDJSON batch.
    ///
    /// Fails with [`Error::BulkTransport`] when the request as a whole fails.
    async fn bulk(&self, index: &str, batch: &BulkBatch) -> Result<BulkResponse>;
}

/// Writes batches to a [`Destination`] and accounts per-item failures.
pub struct BulkWriter<D> {
    destination: D,
    retry: RetryConfig,
}

impl<D: Destination> BulkWriter<D> {
    /// Creates a writer with the given retry policy for bulk requests.
    pub fn new(destination: D, retry: RetryConfig) -> Self {
        Self { destination, retry }
    }

    /// Underlying destination.
    pub fn destination(&self) -> &D {
        &self.destination
    }

    /// Makes sure `index` exists, creating it with `body` when allowed.
    ///
    /// An existing index is left untouched, whatever its mapping.
    ///
    /// # Errors
    ///
    /// [`Error::IndexNotFound`] if absent and `create` is false,
    /// [`Error::TargetProvisioning`] if creation fails.
    pub async fn ensure_index(&self, index: &str, body: &Value, create: bool) -> Result<()> {
        let exists = self
            .destination
            .index_exists(index)
            .await
            .map_err(|e| Error::TargetProvisioning {
                index: index.to_string(),
                reason: e.to_string(),
            })?;

        if exists {
            debug!(index, "destination index already exists");
            return Ok(());
        }
        if !create {
            return Err(Error::IndexNotFound(index.to_string()));
        }

        self.destination
            .create_index(index, body)
            .await
            .map_err(|e| match e {
                Error::TargetProvisioning { .. } => e,
                other => Error::TargetProvisioning {
                    index: index.to_string(),
                    reason: other.to_string(),
                },
            })
    }

    /// Writes a batch and reports which items failed.
    ///
    /// Every failed item is logged as a warning.
    ///
    /// # Errors
    ///
    /// Returns the transport error once retries are exhausted.
    pub async fn write(&self, batch: &BulkBatch, index: &str) -> Result<BulkOutcome> {
        if batch.is_empty() {
            return Ok(BulkOutcome::default());
        }

        let response = with_retry(&self.retry, "bulk write", || {
            self.destination.bulk(index, batch)
        })
        .await?;

        let mut outcome = BulkOutcome {
            attempted: batch.len() as u64,
            failed: Vec::new(),
        };

        if response.errors || response.items.iter().any(BulkItem::is_failure) {
            for item in response.items.iter().filter(|i| i.is_failure()) {
                let reason = item.reason();
                warn!(
                    index,
                    id = %item.id,
                    status = item.status,
                    "failed to index document: {}",
                    reason
                );
                outcome.failed.push(FailedItem {
                    id: item.id.clone(),
                    status: item.status,
                    reason,
                });
            }
        }

        Ok(outcome)
    }
}
