//! Durable queue between extraction and indexing.
//!
//! In buffered mode, pages read from the source are pushed here instead of
//! being indexed. [`ResumeConsumer`] later drains the queue through the same
//! transform and bulk write as a direct migration. The queue is the only
//! checkpoint of the system: extraction itself always restarts from the
//! start cursor.
//!
//! Entries are single JSON-serialized documents. Producers push at the head
//! of a list; consumers read from the tail, so consumption is FIFO.

pub mod buffer;
pub mod memory;
pub mod redis;
pub mod resume;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use buffer::{DumpResult, QueueBuffer};
pub use memory::MemoryQueue;
pub use self::redis::RedisQueue;
pub use resume::ResumeConsumer;

/// Configuration for the durable queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Redis URL (e.g., redis://localhost:6379).
    #[serde(default = "default_url")]
    pub url: String,
    /// List key holding queued documents.
    #[serde(default = "default_key")]
    pub key: String,
    /// Documents replayed per bulk request when resuming.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            key: default_key(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_url() -> String {
    "redis://redis:6379".to_string()
}

fn default_key() -> String {
    "solr2es:queue".to_string()
}

fn default_batch_size() -> usize {
    1000
}

/// Append-only list store used as the durable queue.
#[async_trait]
pub trait DurableQueue: Send + Sync {
    /// Appends values, in order, without waiting for any consumer.
    async fn push(&self, key: &str, values: Vec<String>) -> Result<()>;

    /// Returns up to `max` of the oldest values, oldest first, without removing them.
    async fn peek_oldest(&self, key: &str, max: usize) -> Result<Vec<String>>;

    /// Removes the `count` oldest values.
    async fn remove_oldest(&self, key: &str, count: usize) -> Result<()>;

    /// Number of queued values.
    async fn len(&self, key: &str) -> Result<u64>;
}
