//! Cursor-paginated extraction from the source index.
//!
//! A [`CursorPager`] fetches one page per call. [`CursorWalk`] drives a pager
//! from the start cursor and applies the fixed-point termination rule: the
//! stream ends when the cursor returned for a request equals the cursor sent.
//! An empty page is not an end-of-stream signal.

pub mod solr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::runtime::CancelFlag;

pub use solr::{SolrConfig, SolrPager};

/// A source document: ordered field name to value mapping.
///
/// Must contain an `id` field, used as the destination record key.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Sentinel cursor value marking the start of the stream.
pub const START_CURSOR: &str = "*";

/// Opaque pagination token.
///
/// Equality is the only meaningful operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Cursor for the first request of a stream.
    #[must_use]
    pub fn start() -> Self {
        Self(START_CURSOR.to_string())
    }

    /// Wraps a token returned by the source.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Whether this is the start sentinel.
    #[must_use]
    pub fn is_start(&self) -> bool {
        self.0 == START_CURSOR
    }

    /// Raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of results.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Documents in id order.
    pub documents: Vec<Document>,
    /// Cursor to send with the next request.
    pub next_cursor: Cursor,
    /// Total matching documents; only populated for the start cursor.
    pub total_hits: Option<u64>,
}

impl Page {
    /// Number of documents in the page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the page holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Fetches pages from a cursor-paginated source.
///
/// Implementations must query in ascending id order so that cursors are
/// stable. A transport or query failure is returned as
/// [`Error::SourceUnavailable`] and is fatal to the run.
#[async_trait]
pub trait CursorPager: Send + Sync {
    /// Source type name, for logs.
    fn source_type(&self) -> &'static str;

    /// Fetches the page that starts at `cursor`.
    async fn fetch(&self, cursor: &Cursor) -> Result<Page>;
}

/// Limits that stop a walk over a source that never repeats a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkGuard {
    /// Maximum number of requests, including the final fixed-point request.
    pub max_pages: Option<u64>,
    /// Consecutive empty pages with an advancing cursor tolerated.
    pub max_empty_pages: u32,
}

impl Default for WalkGuard {
    fn default() -> Self {
        Self {
            max_pages: None,
            max_empty_pages: 3,
        }
    }
}

/// Drives a [`CursorPager`] from the start cursor to its fixed point.
pub struct CursorWalk<'a, P: CursorPager + ?Sized> {
    pager: &'a P,
    cursor: Cursor,
    guard: WalkGuard,
    cancel: CancelFlag,
    finished: bool,
    requests: u64,
    empty_streak: u32,
    read: u64,
    total_hits: Option<u64>,
}

impl<'a, P: CursorPager + ?Sized> CursorWalk<'a, P> {
    /// Starts a walk at the start cursor.
    pub fn new(pager: &'a P, guard: WalkGuard, cancel: CancelFlag) -> Self {
        Self {
            pager,
            cursor: Cursor::start(),
            guard,
            cancel,
            finished: false,
            requests: 0,
            empty_streak: 0,
            read: 0,
            total_hits: None,
        }
    }

    /// Returns the next page, or `None` once the fixed point is reached.
    ///
    /// # Errors
    ///
    /// Propagates source failures, and returns [`Error::Stagnation`] or
    /// [`Error::Cancelled`] when a guard stops the walk.
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        if self.finished {
            return Ok(None);
        }
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled(self.read));
        }
        if let Some(max) = self.guard.max_pages {
            if self.requests >= max {
                return Err(Error::Stagnation(format!(
                    "no fixed point after {} page requests (cursor {})",
                    self.requests, self.cursor
                )));
            }
        }

        let page = self.pager.fetch(&self.cursor).await?;
        self.requests += 1;

        if self.cursor.is_start() {
            self.total_hits = page.total_hits;
            info!(
                source = self.pager.source_type(),
                "found {} documents",
                page.total_hits.map_or("unknown".to_string(), |t| t.to_string())
            );
        }

        if page.next_cursor == self.cursor {
            self.finished = true;
            debug!(requests = self.requests, read = self.read, "cursor reached its fixed point");
            return Ok(None);
        }

        if page.is_empty() {
            self.empty_streak += 1;
            if self.empty_streak > self.guard.max_empty_pages {
                return Err(Error::Stagnation(format!(
                    "{} consecutive empty pages while the cursor kept advancing",
                    self.empty_streak
                )));
            }
        } else {
            self.empty_streak = 0;
        }

        self.cursor = page.next_cursor.clone();
        self.read += page.len() as u64;
        debug!(cursor = %self.cursor, read = self.read, "fetched page");

        Ok(Some(page))
    }

    /// Total hits reported by the first page, once it has been fetched.
    #[must_use]
    pub fn total_hits(&self) -> Option<u64> {
        self.total_hits
    }

    /// Number of page requests sent so far.
    #[must_use]
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Documents read so far.
    #[must_use]
    pub fn read(&self) -> u64 {
        self.read
    }
}
