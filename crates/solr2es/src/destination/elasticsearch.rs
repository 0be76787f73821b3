//! Elasticsearch destination over the REST API.
//!
//! Index provisioning uses `HEAD /{index}` and `PUT /{index}`; documents go
//! through `POST /{index}/_bulk` with an NDJSON body.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::destination::{BulkItem, BulkResponse, Destination};
use crate::error::{Error, Result};
use crate::http::create_http_client;
use crate::transform::BulkBatch;

/// Configuration for the Elasticsearch destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Elasticsearch URL (e.g., http://localhost:9200).
    #[serde(default = "default_url")]
    pub url: String,
    /// Target index.
    #[serde(default = "default_index")]
    pub index: String,
    /// Mapping type written in bulk directives; `null` omits it.
    #[serde(default = "default_doc_type")]
    pub doc_type: Option<String>,
    /// Refresh the index after each bulk request.
    #[serde(default)]
    pub refresh: bool,
    /// Create the index when it does not exist.
    #[serde(default = "default_true")]
    pub create_index: bool,
    /// Index mappings: inline JSON or `"@path/to/file.json"`.
    #[serde(default)]
    pub mappings: Option<Value>,
    /// Index settings: inline JSON or `"@path/to/file.json"`.
    #[serde(default)]
    pub settings: Option<Value>,
    /// Optional username for Basic auth.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional password for Basic auth.
    #[serde(default)]
    pub password: Option<String>,
    /// Optional API key for authentication.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            index: default_index(),
            doc_type: default_doc_type(),
            refresh: false,
            create_index: true,
            mappings: None,
            settings: None,
            username: None,
            password: None,
            api_key: None,
        }
    }
}

fn default_url() -> String {
    "http://elasticsearch:9200".to_string()
}

fn default_index() -> String {
    "solr2es".to_string()
}

fn default_doc_type() -> Option<String> {
    Some("doc".to_string())
}

fn default_true() -> bool {
    true
}

/// `_bulk` response body.
#[derive(Debug, Deserialize)]
struct RawBulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, RawBulkItem>>,
}

#[derive(Debug, Deserialize)]
struct RawBulkItem {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

impl From<RawBulkResponse> for BulkResponse {
    fn from(raw: RawBulkResponse) -> Self {
        let items = raw
            .items
            .into_iter()
            .filter_map(|action| action.into_values().next())
            .map(|item| BulkItem {
                id: item.id.unwrap_or_default(),
                status: item.status,
                error: item.error,
            })
            .collect();
        Self {
            errors: raw.errors,
            items,
        }
    }
}

/// Elasticsearch destination.
pub struct ElasticsearchDestination {
    config: ElasticsearchConfig,
    client: Client,
}

impl ElasticsearchDestination {
    /// Creates a new Elasticsearch destination with a configured HTTP client.
    pub fn new(config: ElasticsearchConfig) -> Self {
        Self {
            config,
            client: create_http_client(),
        }
    }

    /// Builds the URL of an index.
    fn build_index_url(&self, index: &str) -> String {
        format!(
            "{}/{}",
            self.config.url.trim_end_matches('/'),
            index.trim_start_matches('/')
        )
    }

    /// Builds the bulk URL for an index.
    fn build_bulk_url(&self, index: &str) -> String {
        format!(
            "{}/_bulk?refresh={}",
            self.build_index_url(index),
            self.config.refresh
        )
    }

    /// Applies authentication to a request.
    fn authenticate(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(api_key) = &self.config.api_key {
            req = req.header("Authorization", format!("ApiKey {}", api_key));
        } else if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            req = req.basic_auth(user, Some(pass));
        }
        req
    }
}

async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

#[async_trait]
impl Destination for ElasticsearchDestination {
    fn destination_type(&self) -> &'static str {
        "elasticsearch"
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        let url = self.build_index_url(index);
        let response = self
            .authenticate(self.client.head(&url))
            .send()
            .await
            .map_err(|e| Error::TargetProvisioning {
                index: index.to_string(),
                reason: format!("Elasticsearch request failed: {}", e),
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Authentication(
                format!("Elasticsearch auth failed for index '{}'", index),
            )),
            status => Err(Error::TargetProvisioning {
                index: index.to_string(),
                reason: format!("unexpected status {} checking index", status),
            }),
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<()> {
        let url = self.build_index_url(index);
        let response = self
            .authenticate(self.client.put(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::TargetProvisioning {
                index: index.to_string(),
                reason: format!("Elasticsearch request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::TargetProvisioning {
                index: index.to_string(),
                reason: format!("Elasticsearch error {}: {}", status, error_body(response).await),
            });
        }

        Ok(())
    }

    async fn bulk(&self, index: &str, batch: &BulkBatch) -> Result<BulkResponse> {
        let url = self.build_bulk_url(index);
        let response = self
            .authenticate(self.client.post(&url))
            .header("Content-Type", "application/x-ndjson")
            .body(batch.body.clone())
            .send()
            .await
            .map_err(|e| Error::BulkTransport(format!("Elasticsearch request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(Error::RateLimit(60));
            }
            return Err(Error::BulkTransport(format!(
                "Elasticsearch error {}: {}",
                status,
                error_body(response).await
            )));
        }

        let raw: RawBulkResponse = response
            .json()
            .await
            .map_err(|e| Error::BulkTransport(format!("Failed to parse bulk response: {}", e)))?;

        Ok(raw.into())
    }
}

#[cfg(test)]
#[path = "elasticsearch_tests.rs"]
mod tests;
