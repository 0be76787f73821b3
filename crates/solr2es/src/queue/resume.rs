//! Replays queued documents into the destination.
//!
//! Batches are read oldest first and removed from the queue only after the
//! bulk write returned, so a crash mid-write replays that batch on the next
//! run. Replays are safe because writes are keyed by document id.

use serde_json::Value;
use std::time::Instant;
use tracing::{info, warn};

use crate::destination::{BulkWriter, Destination};
use crate::error::{Error, Result};
use crate::pipeline::{index_documents, MigrationResult, PipelineOptions};
use crate::progress::ProgressTracker;
use crate::queue::DurableQueue;
use crate::source::Document;
use crate::transform::{collapse_arrays, document_id, Transformer};

/// Drains a durable queue through the transform and bulk write.
pub struct ResumeConsumer<Q, D> {
    queue: Q,
    key: String,
    batch_size: usize,
    writer: BulkWriter<D>,
    transformer: Transformer,
    index_body: Value,
    options: PipelineOptions,
}

impl<Q: DurableQueue, D: Destination> ResumeConsumer<Q, D> {
    /// Creates a consumer reading `batch_size` documents per bulk request.
    pub fn new(
        queue: Q,
        key: impl Into<String>,
        batch_size: usize,
        writer: BulkWriter<D>,
        transformer: Transformer,
    ) -> Self {
        Self {
            queue,
            key: key.into(),
            batch_size: batch_size.max(1),
            writer,
            transformer,
            index_body: Value::Object(serde_json::Map::new()),
            options: PipelineOptions::default(),
        }
    }

    /// Settings and mappings used if the index must be created.
    #[must_use]
    pub fn with_index_body(mut self, body: Value) -> Self {
        self.index_body = body;
        self
    }

    /// Replaces the pipeline options.
    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Underlying queue.
    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Bulk writer.
    pub fn writer(&self) -> &BulkWriter<D> {
        &self.writer
    }

    /// Indexes every queued document into `index`, oldest first.
    ///
    /// Entries that are not JSON documents with a usable `id` are dropped and
    /// counted as failed.
    ///
    /// # Errors
    ///
    /// Queue, provisioning and transport errors abort the run; the batch in
    /// flight stays queued.
    pub async fn resume(&self, index: &str) -> Result<MigrationResult> {
        let start = Instant::now();

        let pending = self.queue.len(&self.key).await?;
        info!(key = %self.key, index, "resuming {} queued documents", pending);

        self.writer
            .ensure_index(index, &self.index_body, self.options.create_index)
            .await?;

        let mut progress = ProgressTracker::new("indexed", self.options.progress_every)
            .with_bar(self.options.show_progress_bar);
        progress.set_total(Some(pending));
        let mut result = MigrationResult {
            total_hits: Some(pending),
            ..Default::default()
        };

        loop {
            if self.options.cancel.is_cancelled() {
                return Err(Error::Cancelled(result.indexed));
            }

            let raw = self.queue.peek_oldest(&self.key, self.batch_size).await?;
            if raw.is_empty() {
                break;
            }

            let (documents, malformed) = decode_entries(&raw);
            let outcome =
                index_documents(&self.transformer, &self.writer, index, &documents).await?;
            self.queue.remove_oldest(&self.key, raw.len()).await?;

            result.record(documents.len() as u64, &outcome);
            result.extracted += malformed;
            result.failed += malformed;
            progress.update(result.indexed);
        }

        progress.finish("Resume complete");
        result.duration_secs = start.elapsed().as_secs_f64();

        info!(
            "resumed {} documents: {} indexed, {} failed in {:.2}s",
            result.extracted, result.indexed, result.failed, result.duration_secs
        );

        Ok(result)
    }
}

/// Parses queue entries, returning the documents and the number of bad entries.
///
/// Documents without a usable `id` count as bad entries.
fn decode_entries(raw: &[String]) -> (Vec<Document>, u64) {
    let mut documents = Vec::with_capacity(raw.len());
    let mut malformed = 0;

    for entry in raw {
        let decoded = serde_json::from_str::<Document>(entry)
            .map_err(Error::from)
            .and_then(|doc| document_id(&collapse_arrays(&doc)).map(|_| doc));
        match decoded {
            Ok(doc) => documents.push(doc),
            Err(e) => {
                warn!("dropping malformed queue entry: {}", e);
                malformed += 1;
            }
        }
    }

    (documents, malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entries_skips_malformed() {
        let raw = vec![
            r#"{"id":"1"}"#.to_string(),
            "not json".to_string(),
            r#"["an","array"]"#.to_string(),
            r#"{"id":"2","tags":["a"]}"#.to_string(),
            r#"{"title":"no id"}"#.to_string(),
            r#"{"id":{"nested":true}}"#.to_string(),
            r#"{"id":[3]}"#.to_string(),
        ];
        let (documents, malformed) = decode_entries(&raw);

        assert_eq!(documents.len(), 3);
        assert_eq!(malformed, 4);
        assert_eq!(documents[1]["tags"], serde_json::json!(["a"]));
    }
}
