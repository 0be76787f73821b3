//! Retry logic with exponential backoff for bulk writes.
//!
//! Bulk writes are idempotent by id, which makes them the one operation that
//! is safe to resubmit. Only transient failures are retried.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Initial delay before the first retry.
    #[serde(with = "millis")]
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    #[serde(with = "millis")]
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (e.g., 2.0 doubles delay each retry).
    pub backoff_multiplier: f64,
    /// Whether to add jitter to prevent thundering herd.
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

/// Durations as integer milliseconds in config files.
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

impl RetryConfig {
    /// Creates a config with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            add_jitter: false,
        }
    }

    /// Calculates the delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_delay = self.initial_delay.as_secs_f64()
            * self
                .backoff_multiplier
                .powi(attempt.saturating_sub(1) as i32);

        let capped_delay = base_delay.min(self.max_delay.as_secs_f64());

        let final_delay = if self.add_jitter {
            // up to 25%
            capped_delay + capped_delay * 0.25 * rand_jitter()
        } else {
            capped_delay
        };

        Duration::from_secs_f64(final_delay)
    }
}

/// Pseudo-random jitter in [0, 1) from the clock.
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// Determines if an error is worth retrying.
pub fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::RateLimit(_) | Error::Io(_) => true,
        Error::Http(e) => e.is_timeout() || e.is_connect(),
        Error::Redis(e) => e.is_timeout() || e.is_connection_dropped() || e.is_io_error(),
        Error::BulkTransport(msg) | Error::SourceUnavailable(msg) | Error::Queue(msg) => {
            is_transient_message(msg)
        }
        _ => false,
    }
}

/// Classifies a failure message.
///
/// Messages are `"<context> <status>...: <body>"` for HTTP failures. When the
/// context names a status, only that status decides; the body is never
/// scanned. Other messages are transport failures.
fn is_transient_message(msg: &str) -> bool {
    let context = msg.split_once(':').map_or(msg, |(head, _)| head);
    if let Some(status) = status_code(context) {
        return status == 429 || (500..600).contains(&status);
    }

    let msg = msg.to_lowercase();
    msg.contains("timeout")
        || msg.contains("timed out")
        || msg.contains("connection refused")
        || msg.contains("connection reset")
        || msg.contains("temporary")
}

/// First HTTP status code in `context`.
fn status_code(context: &str) -> Option<u16> {
    context
        .split_whitespace()
        .filter(|word| word.len() == 3)
        .filter_map(|word| word.parse::<u16>().ok())
        .find(|code| (100..600).contains(code))
}

/// Executes an async operation with retry logic.
///
/// Returns the first success, the first non-retryable error, or the last
/// error once all attempts are used.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = config.delay_for_attempt(attempt);
            debug!(
                "{}: retry attempt {}/{} after {:?}",
                operation_name, attempt, config.max_retries, delay
            );
            sleep(delay).await;
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("{}: succeeded after {} retries", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) if is_retryable_error(&e) && attempt < config.max_retries => {
                warn!(
                    "{}: retryable error (attempt {}/{}): {}",
                    operation_name,
                    attempt + 1,
                    config.max_retries + 1,
                    e
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
