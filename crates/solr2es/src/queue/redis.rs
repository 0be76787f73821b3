//! Redis list used as the durable queue.
//!
//! Producers `LPUSH` at the head; the consumer reads the tail with `LRANGE`
//! and drops what it wrote with `LTRIM`. Trimming from the tail never touches
//! entries pushed concurrently at the head.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::error::{Error, Result};
use crate::queue::DurableQueue;

/// Durable queue backed by a Redis list.
#[derive(Clone)]
pub struct RedisQueue {
    conn: MultiplexedConnection,
}

impl RedisQueue {
    /// Connects to Redis at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Queue`] if the server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::Queue(format!("invalid Redis URL '{}': {}", url, e)))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Queue(format!("Redis connection failed: {}", e)))?;
        Ok(Self { conn })
    }
}

/// `LRANGE` bounds selecting the `max` oldest entries.
fn tail_range(max: usize) -> (isize, isize) {
    (-clamp(max), -1)
}

/// `LTRIM` bounds keeping everything but the `count` oldest entries.
fn trim_range(count: usize) -> (isize, isize) {
    (0, (-clamp(count)).saturating_sub(1))
}

/// Redis list offsets are signed; oversized counts mean the whole list.
fn clamp(count: usize) -> isize {
    isize::try_from(count).unwrap_or(isize::MAX)
}

#[async_trait]
impl DurableQueue for RedisQueue {
    async fn push(&self, key: &str, values: Vec<String>) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(key, values).await?;
        Ok(())
    }

    async fn peek_oldest(&self, key: &str, max: usize) -> Result<Vec<String>> {
        if max == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let (start, stop) = tail_range(max);
        let mut values: Vec<String> = conn.lrange(key, start, stop).await?;
        // Tail is oldest.
        values.reverse();
        Ok(values)
    }

    async fn remove_oldest(&self, key: &str, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let (start, stop) = trim_range(count);
        conn.ltrim::<_, ()>(key, start, stop).await?;
        Ok(())
    }

    async fn len(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.llen(key).await?)
    }
}
