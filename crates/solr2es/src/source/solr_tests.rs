//! Tests for the Solr cursor pager.

use super::*;
use crate::source::CursorPager;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(url: &str) -> SolrConfig {
    SolrConfig {
        url: url.to_string(),
        rows: 2,
        ..SolrConfig::default()
    }
}

#[test]
fn test_solr_config_defaults() {
    let config: SolrConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config.url, "http://solr:8983/solr/my_core");
    assert_eq!(config.query, "*:*");
    assert_eq!(config.sort, "id asc");
    assert_eq!(config.rows, 1000);
    assert!(config.username.is_none());
}

#[test]
fn test_solr_build_select_url_trailing_slash() {
    let pager = SolrPager::new(test_config("http://localhost:8983/solr/core/"));
    assert_eq!(
        pager.build_select_url(),
        "http://localhost:8983/solr/core/select"
    );
}

#[test]
fn test_solr_build_params() {
    let pager = SolrPager::new(test_config("http://localhost:8983/solr/core"));
    let params = pager.build_params(&Cursor::start());
    assert!(params.contains(&("cursorMark", "*".to_string())));
    assert!(params.contains(&("sort", "id asc".to_string())));
    assert!(params.contains(&("rows", "2".to_string())));
    assert!(params.contains(&("wt", "json".to_string())));
}

#[test]
fn test_select_response_deserialization() {
    let json = r#"{
        "responseHeader": {"status": 0},
        "response": {"numFound": 3, "start": 0, "docs": [{"id": "1", "tags": ["a", "b"]}]},
        "nextCursorMark": "AoE/ATE="
    }"#;
    let response: SelectResponse = serde_json::from_str(json).unwrap();
    assert_eq!(response.response.num_found, 3);
    assert_eq!(response.response.docs.len(), 1);
    assert_eq!(response.next_cursor_mark, "AoE/ATE=");
}

#[test]
fn test_select_response_keeps_field_order() {
    let json = r#"{"response":{"numFound":1,"docs":[{"z":1,"id":"1","a":2}]},"nextCursorMark":"x"}"#;
    let response: SelectResponse = serde_json::from_str(json).unwrap();
    let keys: Vec<&String> = response.response.docs[0].keys().collect();
    assert_eq!(keys, ["z", "id", "a"]);
}

#[tokio::test]
async fn test_fetch_first_page_reports_total_hits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/solr/core/select"))
        .and(query_param("cursorMark", "*"))
        .and(query_param("sort", "id asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": {"numFound": 3, "docs": [{"id": "1"}, {"id": "2"}]},
            "nextCursorMark": "AoE/ATI="
        })))
        .mount(&server)
        .await;

    let pager = SolrPager::new(test_config(&format!("{}/solr/core", server.uri())));
    let page = pager.fetch(&Cursor::start()).await.unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page.total_hits, Some(3));
    assert_eq!(page.next_cursor, Cursor::new("AoE/ATI="));
}

#[tokio::test]
async fn test_fetch_later_page_omits_total_hits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/select"))
        .and(query_param("cursorMark", "AoE/ATI="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": {"numFound": 3, "docs": [{"id": "3"}]},
            "nextCursorMark": "AoE/ATM="
        })))
        .mount(&server)
        .await;

    let pager = SolrPager::new(test_config(&server.uri()));
    let page = pager.fetch(&Cursor::new("AoE/ATI=")).await.unwrap();

    assert_eq!(page.len(), 1);
    assert!(page.total_hits.is_none());
}

#[tokio::test]
async fn test_fetch_server_error_is_source_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/select"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let pager = SolrPager::new(test_config(&server.uri()));
    let err = pager.fetch(&Cursor::start()).await.unwrap_err();

    assert!(matches!(err, Error::SourceUnavailable(_)));
}

#[tokio::test]
async fn test_fetch_malformed_body_is_source_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/select"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let pager = SolrPager::new(test_config(&server.uri()));
    let err = pager.fetch(&Cursor::start()).await.unwrap_err();

    assert!(matches!(err, Error::SourceUnavailable(ref m) if m.contains("parse")));
}
