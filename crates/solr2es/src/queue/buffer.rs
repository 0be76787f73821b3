//! Buffered extraction: source pages pushed onto the durable queue.

use std::time::Instant;
use tracing::info;

use crate::error::Result;
use crate::progress::ProgressTracker;
use crate::queue::DurableQueue;
use crate::runtime::CancelFlag;
use crate::source::{CursorPager, CursorWalk, Page, WalkGuard};

/// Statistics of a dump run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DumpResult {
    /// Documents pushed onto the queue.
    pub queued: u64,
    /// Pages read from the source (excluding the fixed-point request).
    pub pages: u64,
    /// Total hits reported by the source.
    pub total_hits: Option<u64>,
    /// Duration in seconds.
    pub duration_secs: f64,
}

/// Pushes pages onto a durable queue.
pub struct QueueBuffer<Q> {
    queue: Q,
    key: String,
}

impl<Q: DurableQueue> QueueBuffer<Q> {
    /// Creates a buffer writing to the list at `key`.
    pub fn new(queue: Q, key: impl Into<String>) -> Self {
        Self {
            queue,
            key: key.into(),
        }
    }

    /// Underlying queue.
    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Serializes each document of the page and appends it to the queue.
    ///
    /// Does not wait for, or track, any consumer.
    pub async fn push(&self, page: &Page) -> Result<()> {
        let values = page
            .documents
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.queue.push(&self.key, values).await
    }

    /// Reads the whole source and queues every page.
    ///
    /// # Errors
    ///
    /// Source and queue failures abort the dump. Pages already pushed stay
    /// queued.
    pub async fn dump<P: CursorPager + ?Sized>(
        &self,
        pager: &P,
        guard: WalkGuard,
        cancel: CancelFlag,
        progress_every: u64,
    ) -> Result<DumpResult> {
        let start = Instant::now();
        let mut walk = CursorWalk::new(pager, guard, cancel);
        let mut progress = ProgressTracker::new("queued", progress_every);
        let mut result = DumpResult::default();

        while let Some(page) = walk.next_page().await? {
            if result.pages == 0 {
                progress.set_total(walk.total_hits());
            }
            self.push(&page).await?;
            result.pages += 1;
            result.queued += page.len() as u64;
            progress.update(result.queued);
        }

        result.total_hits = walk.total_hits();
        result.duration_secs = start.elapsed().as_secs_f64();
        info!(key = %self.key, "queued {} documents in {:.2}s", result.queued, result.duration_secs);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MemoryQueue;
    use crate::source::{Cursor, Document};
    use serde_json::json;

    fn page(ids: &[&str]) -> Page {
        Page {
            documents: ids
                .iter()
                .map(|id| {
                    let mut doc = Document::new();
                    doc.insert("id".to_string(), json!(id));
                    doc.insert("tags".to_string(), json!(["x", "y"]));
                    doc
                })
                .collect(),
            next_cursor: Cursor::new("next"),
            total_hits: None,
        }
    }

    #[tokio::test]
    async fn test_push_serializes_each_document() {
        let buffer = QueueBuffer::new(MemoryQueue::new(), "q");
        buffer.push(&page(&["1", "2"])).await.unwrap();

        let queued = buffer.queue().snapshot("q");
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0], r#"{"id":"1","tags":["x","y"]}"#);
    }

    #[tokio::test]
    async fn test_push_empty_page() {
        let buffer = QueueBuffer::new(MemoryQueue::new(), "q");
        buffer.push(&page(&[])).await.unwrap();
        assert!(buffer.queue().snapshot("q").is_empty());
    }
}
