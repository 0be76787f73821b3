// Migration tool - pedantic lints relaxed for CLI ergonomics
#![allow(clippy::pedantic)]

//! # solr2es
//!
//! `solr2es` is a CLI tool and library for copying every document of a Solr
//! core into an Elasticsearch index.
//!
//! The source is walked with Solr's `cursorMark` deep paging until the cursor
//! stops moving. Each page is turned into an NDJSON bulk request, with every
//! array-valued field collapsed to its first element, and written before the
//! next page is requested.
//!
//! ## Modes
//!
//! | Command | What it does |
//! |---------|--------------|
//! | `migrate` | Solr → Elasticsearch, page by page |
//! | `dump` | Solr → Redis queue, no indexing |
//! | `resume` | Redis queue → Elasticsearch |
//!
//! Both `migrate` and `resume` run either on a blocking thread of control or
//! on a cooperative single-threaded scheduler (`--async`).
//!
//! ## Quick Start
//!
//! ```bash
//! # Direct migration with the default hosts
//! solr2es migrate --index articles
//!
//! # Buffered: extract now, index later
//! solr2es dump
//! solr2es resume --index articles
//! ```
//!
//! ## Configuration Example
//!
//! ```yaml
//! source:
//!   url: http://localhost:8983/solr/articles
//!   rows: 1000
//!
//! destination:
//!   url: http://localhost:9200
//!   index: articles
//!   doc_type: null
//!   mappings: "@mappings.json"
//!
//! queue:
//!   url: redis://localhost:6379
//!   key: articles:queue
//!
//! options:
//!   progress_every: 10000
//!   mode: cooperative
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod destination;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod progress;
pub mod queue;
pub mod retry;
pub mod runtime;
pub mod source;
pub mod transform;

pub use config::{index_body, load_json_arg, MigrationConfig, MigrationOptions};
pub use destination::{BulkOutcome, BulkWriter, Destination, ElasticsearchDestination};
pub use error::{Error, Result};
pub use pipeline::{Migration, MigrationResult, PipelineOptions};
pub use queue::{DumpResult, DurableQueue, MemoryQueue, QueueBuffer, RedisQueue, ResumeConsumer};
pub use runtime::{CancelFlag, ExecutionMode};
pub use source::{Cursor, CursorPager, Document, Page, SolrPager};
pub use transform::Transformer;
