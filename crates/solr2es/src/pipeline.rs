//! Migration pipeline orchestration.
//!
//! Pages are pulled from the source one at a time, in cursor order, then
//! transformed and written before the next page is requested. The success
//! tally grows by the page size and shrinks by the items the destination
//! rejected.

use serde_json::Value;
use std::time::Instant;
use tracing::info;

use crate::destination::{BulkOutcome, BulkWriter, Destination};
use crate::error::{Error, Result};
use crate::progress::{ProgressTracker, DEFAULT_PROGRESS_EVERY};
use crate::runtime::CancelFlag;
use crate::source::{CursorPager, CursorWalk, Document, WalkGuard};
use crate::transform::Transformer;

/// Migration statistics.
///
/// `indexed` is the success tally and the authoritative result of a run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MigrationResult {
    /// Documents written successfully.
    pub indexed: u64,
    /// Documents read (from the source or the queue).
    pub extracted: u64,
    /// Documents rejected by the destination.
    pub failed: u64,
    /// Batches written.
    pub pages: u64,
    /// Total hits reported by the source, if known.
    pub total_hits: Option<u64>,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl MigrationResult {
    /// Calculate throughput (documents per second).
    #[must_use]
    pub fn throughput(&self) -> f64 {
        if self.duration_secs > 0.0 {
            self.indexed as f64 / self.duration_secs
        } else {
            0.0
        }
    }

    /// Folds one batch outcome into the tally.
    pub fn record(&mut self, read: u64, outcome: &BulkOutcome) {
        let failed = outcome.failed.len() as u64;
        self.extracted += read;
        self.indexed += read;
        self.indexed = self.indexed.saturating_sub(failed);
        self.failed += failed;
        self.pages += 1;
    }
}

/// Knobs shared by the direct and the resumed pipelines.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Pagination stop guards.
    pub guard: WalkGuard,
    /// Documents between two progress notifications.
    pub progress_every: u64,
    /// Draw a terminal progress bar.
    pub show_progress_bar: bool,
    /// Create the destination index when absent.
    pub create_index: bool,
    /// Cancellation observed between pages.
    pub cancel: CancelFlag,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            guard: WalkGuard::default(),
            progress_every: DEFAULT_PROGRESS_EVERY,
            show_progress_bar: false,
            create_index: true,
            cancel: CancelFlag::new(),
        }
    }
}

/// Transforms a page and writes it; the write step every path goes through.
pub(crate) async fn index_documents<D: Destination>(
    transformer: &Transformer,
    writer: &BulkWriter<D>,
    index: &str,
    documents: &[Document],
) -> Result<BulkOutcome> {
    let batch = transformer.transform(index, documents)?;
    writer.write(&batch, index).await
}

/// Direct source-to-destination migration.
pub struct Migration<P, D> {
    pager: P,
    writer: BulkWriter<D>,
    transformer: Transformer,
    options: PipelineOptions,
}

impl<P: CursorPager, D: Destination> Migration<P, D> {
    /// Create a new migration pipeline.
    pub fn new(pager: P, writer: BulkWriter<D>, transformer: Transformer) -> Self {
        Self {
            pager,
            writer,
            transformer,
            options: PipelineOptions::default(),
        }
    }

    /// Replaces the pipeline options.
    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Source pager.
    pub fn pager(&self) -> &P {
        &self.pager
    }

    /// Bulk writer.
    pub fn writer(&self) -> &BulkWriter<D> {
        &self.writer
    }

    /// Copies the whole source into `index`.
    ///
    /// The index is created with `index_body` (settings and mappings) when
    /// absent; an existing index is used as is.
    ///
    /// # Errors
    ///
    /// Any fatal source, provisioning or transport error aborts the run and
    /// discards the partial tally.
    pub async fn migrate(&self, index: &str, index_body: Option<&Value>) -> Result<MigrationResult> {
        let start = Instant::now();
        let empty = Value::Object(serde_json::Map::new());

        info!(
            source = self.pager.source_type(),
            destination = self.writer.destination().destination_type(),
            index,
            "starting migration"
        );

        self.writer
            .ensure_index(index, index_body.unwrap_or(&empty), self.options.create_index)
            .await?;

        let mut walk = CursorWalk::new(&self.pager, self.options.guard, self.options.cancel.clone());
        let mut progress = ProgressTracker::new("indexed", self.options.progress_every)
            .with_bar(self.options.show_progress_bar);
        let mut result = MigrationResult::default();

        loop {
            if self.options.cancel.is_cancelled() {
                return Err(Error::Cancelled(result.indexed));
            }
            let Some(page) = walk.next_page().await? else {
                break;
            };
            if result.pages == 0 {
                progress.set_total(walk.total_hits());
            }

            let outcome =
                index_documents(&self.transformer, &self.writer, index, &page.documents).await?;
            result.record(page.len() as u64, &outcome);
            progress.update(result.indexed);
        }

        progress.finish("Migration complete");
        result.total_hits = walk.total_hits();
        result.duration_secs = start.elapsed().as_secs_f64();

        info!(
            "processed {} documents: {} indexed, {} failed in {:.2}s ({:.0} docs/sec)",
            result.extracted,
            result.indexed,
            result.failed,
            result.duration_secs,
            result.throughput()
        );

        Ok(result)
    }
}
