//! HTTP helpers shared by the Solr and Elasticsearch clients.

use crate::error::{Error, Result};
use reqwest::Client;
use std::time::Duration;

/// Default HTTP timeout for all requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Creates a configured HTTP client with timeout.
#[must_use]
pub fn create_http_client() -> Client {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Validates a service URL scheme.
pub fn validate_url(url: &str, allowed: &[&str]) -> Result<()> {
    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(Error::Config(format!("Invalid URL format: {}", url)));
    };

    if !allowed.contains(&scheme) {
        return Err(Error::Config(format!(
            "Invalid URL scheme in '{}'. Allowed: {}",
            url,
            allowed.join(", ")
        )));
    }

    if rest.is_empty() {
        return Err(Error::Config(format!("Missing host in URL: {}", url)));
    }

    Ok(())
}

/// Maps a failed source response to an error.
pub fn handle_http_error(status_code: u16, body: &str, service: &str) -> Error {
    match status_code {
        429 => Error::RateLimit(60),
        401 | 403 => Error::Authentication(format!("{} auth failed: {}", service, body)),
        _ => Error::SourceUnavailable(format!("{} error {}: {}", service, status_code, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_http_error_rate_limit() {
        let err = handle_http_error(429, "too many requests", "Solr");
        assert!(matches!(err, Error::RateLimit(60)));
    }

    #[test]
    fn test_handle_http_error_auth() {
        let err = handle_http_error(401, "unauthorized", "Solr");
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[test]
    fn test_handle_http_error_other() {
        let err = handle_http_error(500, "internal error", "Solr");
        assert!(matches!(err, Error::SourceUnavailable(ref m) if m.contains("500")));
    }

    #[test]
    fn test_validate_url() {
        let http = ["http", "https"];
        assert!(validate_url("http://solr:8983/solr/core", &http).is_ok());
        assert!(validate_url("https://es.example.com", &http).is_ok());
        assert!(validate_url("redis://redis:6379", &["redis", "rediss"]).is_ok());
        assert!(validate_url("ftp://files.example.com", &http).is_err());
        assert!(validate_url("elasticsearch:9200", &http).is_err());
        assert!(validate_url("http://", &http).is_err());
    }
}
