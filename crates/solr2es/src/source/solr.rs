//! Solr connector using `cursorMark` deep paging.
//!
//! Each request asks `/select` for one page of `*:*` sorted by `id asc`.
//! Solr answers with the documents and a `nextCursorMark`; when that mark
//! equals the one sent, the result set is exhausted.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::http::{create_http_client, handle_http_error};
use crate::source::{Cursor, CursorPager, Document, Page};

/// Configuration for the Solr source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolrConfig {
    /// Core or collection URL (e.g., http://solr:8983/solr/my_core).
    #[serde(default = "default_url")]
    pub url: String,
    /// Query selecting the documents to migrate.
    #[serde(default = "default_query")]
    pub query: String,
    /// Sort clause. Must end on the unique key for cursors to be stable.
    #[serde(default = "default_sort")]
    pub sort: String,
    /// Documents per page.
    #[serde(default = "default_rows")]
    pub rows: usize,
    /// Optional username for Basic auth.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional password for Basic auth.
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            query: default_query(),
            sort: default_sort(),
            rows: default_rows(),
            username: None,
            password: None,
        }
    }
}

fn default_url() -> String {
    "http://solr:8983/solr/my_core".to_string()
}

fn default_query() -> String {
    "*:*".to_string()
}

fn default_sort() -> String {
    "id asc".to_string()
}

fn default_rows() -> usize {
    1000
}

/// `/select` response body.
#[derive(Debug, Deserialize)]
struct SelectResponse {
    response: ResultSet,
    #[serde(rename = "nextCursorMark")]
    next_cursor_mark: String,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    #[serde(rename = "numFound")]
    num_found: u64,
    #[serde(default)]
    docs: Vec<Document>,
}

/// Cursor pager over a Solr core.
pub struct SolrPager {
    config: SolrConfig,
    client: Client,
}

impl SolrPager {
    /// Creates a new Solr pager with a configured HTTP client.
    pub fn new(config: SolrConfig) -> Self {
        Self {
            config,
            client: create_http_client(),
        }
    }

    /// Builds the `/select` URL for the core.
    fn build_select_url(&self) -> String {
        format!("{}/select", self.config.url.trim_end_matches('/'))
    }

    /// Query parameters for one page.
    fn build_params(&self, cursor: &Cursor) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.config.query.clone()),
            ("sort", self.config.sort.clone()),
            ("rows", self.config.rows.to_string()),
            ("cursorMark", cursor.as_str().to_string()),
            ("wt", "json".to_string()),
        ]
    }
}

#[async_trait]
impl CursorPager for SolrPager {
    fn source_type(&self) -> &'static str {
        "solr"
    }

    async fn fetch(&self, cursor: &Cursor) -> Result<Page> {
        let url = self.build_select_url();

        let mut req = self.client.get(&url).query(&self.build_params(cursor));
        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            req = req.basic_auth(user, Some(pass));
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("Solr request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(handle_http_error(status.as_u16(), &body, "Solr"));
        }

        let select: SelectResponse = response
            .json()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("Failed to parse Solr response: {}", e)))?;

        Ok(Page {
            documents: select.response.docs,
            next_cursor: Cursor::new(select.next_cursor_mark),
            total_hits: cursor.is_start().then_some(select.response.num_found),
        })
    }
}

#[cfg(test)]
#[path = "solr_tests.rs"]
mod tests;
