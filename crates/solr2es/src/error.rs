//! Error types for solr2es.
//!
//! Fatal conditions abort a run and surface as an [`Error`]. Per-item bulk
//! failures are not errors: they come back inside a successful
//! [`BulkOutcome`](crate::destination::BulkOutcome) and only lower the
//! success tally.

use thiserror::Error;

/// Result type alias for solr2es operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while migrating.
#[derive(Error, Debug)]
pub enum Error {
    /// A Solr page could not be fetched or decoded.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// The destination index could not be created.
    #[error("Failed to provision index '{index}': {reason}")]
    TargetProvisioning {
        /// Index that was being created.
        index: String,
        /// Reason reported by the destination.
        reason: String,
    },

    /// The bulk request itself failed (not an item-level error).
    #[error("Bulk request failed: {0}")]
    BulkTransport(String),

    /// The destination index is absent and auto-create is disabled.
    #[error("Index '{0}' not found and index creation is disabled")]
    IndexNotFound(String),

    /// A document carried no usable `id` field.
    #[error("Document has no usable 'id' field: {0}")]
    MissingId(String),

    /// The stagnation guard stopped a pagination that never reached a fixed point.
    #[error("Pagination stalled: {0}")]
    Stagnation(String),

    /// The run was cancelled at a page boundary.
    #[error("Migration cancelled after {0} documents")]
    Cancelled(u64),

    /// Durable queue failure.
    #[error("Queue error: {0}")]
    Queue(String),

    /// Rate limited by a remote service (seconds to wait).
    #[error("Rate limit exceeded, retry after {0}s")]
    RateLimit(u64),

    /// Credentials were rejected.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Redis client error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl Error {
    /// Returns true if the error aborts a run before any write happened.
    #[must_use]
    pub fn is_provisioning(&self) -> bool {
        matches!(self, Self::TargetProvisioning { .. } | Self::IndexNotFound(_))
    }
}
