//! In-process queue, for dry runs and tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::queue::DurableQueue;

/// Queue kept in memory. Not durable across processes.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    lists: Mutex<HashMap<String, VecDeque<String>>>,
}

impl MemoryQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, VecDeque<String>>>> {
        self.lists
            .lock()
            .map_err(|_| Error::Queue("memory queue lock poisoned".to_string()))
    }

    /// Snapshot of a list, oldest first.
    pub fn snapshot(&self, key: &str) -> Vec<String> {
        self.lock()
            .map(|lists| lists.get(key).map(|l| l.iter().cloned().collect()).unwrap_or_default())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DurableQueue for MemoryQueue {
    async fn push(&self, key: &str, values: Vec<String>) -> Result<()> {
        self.lock()?
            .entry(key.to_string())
            .or_default()
            .extend(values);
        Ok(())
    }

    async fn peek_oldest(&self, key: &str, max: usize) -> Result<Vec<String>> {
        Ok(self
            .lock()?
            .get(key)
            .map(|list| list.iter().take(max).cloned().collect())
            .unwrap_or_default())
    }

    async fn remove_oldest(&self, key: &str, count: usize) -> Result<()> {
        let mut lists = self.lock()?;
        if let Some(list) = lists.get_mut(key) {
            let count = count.min(list.len());
            list.drain(..count);
            if list.is_empty() {
                lists.remove(key);
            }
        }
        Ok(())
    }

    async fn len(&self, key: &str) -> Result<u64> {
        Ok(self.lock()?.get(key).map_or(0, |l| l.len() as u64))
    }
}
