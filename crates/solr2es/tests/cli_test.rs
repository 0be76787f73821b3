//! CLI tests for the solr2es binary.
//!
//! None of these contact Solr, Elasticsearch or Redis.

#![allow(clippy::pedantic)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn solr2es() -> Command {
    let mut cmd = Command::cargo_bin("solr2es").unwrap();
    for var in [
        "SOLR2ES_CONFIG",
        "SOLR2ES_SOLR_URL",
        "SOLR2ES_ES_URL",
        "SOLR2ES_REDIS_URL",
        "SOLR2ES_QUEUE_KEY",
        "SOLR2ES_INDEX",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_actions() {
    solr2es()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("dump"))
        .stdout(predicate::str::contains("resume"))
        .stdout(predicate::str::contains("--async"));
}

#[test]
fn test_missing_action_fails() {
    solr2es().assert().failure();
}

#[test]
fn test_init_writes_loadable_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("solr2es.yaml");

    solr2es()
        .args(["init", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated configuration"));

    let config = solr2es::MigrationConfig::from_file(&path).unwrap();
    assert_eq!(config.destination.index, "solr2es");
    assert_eq!(config.queue.key, "solr2es:queue");
}

#[test]
fn test_init_does_not_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("solr2es.yaml");
    std::fs::write(&path, "keep: me\n").unwrap();

    solr2es()
        .args(["init", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep: me\n");

    solr2es()
        .args(["init", "--force", "--output"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_validate_defaults() {
    solr2es()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("http://solr:8983/solr/my_core"));
}

#[test]
fn test_validate_applies_overrides() {
    solr2es()
        .args([
            "validate",
            "--index",
            "articles",
            "--es-url",
            "http://localhost:9200",
            "--async",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("articles"))
        .stdout(predicate::str::contains("http://localhost:9200"))
        .stdout(predicate::str::contains("Cooperative"));
}

#[test]
fn test_validate_reads_env() {
    solr2es()
        .arg("validate")
        .env("SOLR2ES_INDEX", "from-env")
        .assert()
        .success()
        .stdout(predicate::str::contains("from-env"));
}

#[test]
fn test_validate_rejects_bad_url() {
    solr2es()
        .args(["validate", "--redis-url", "http://redis:6379"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid URL scheme"));
}

#[test]
fn test_validate_rejects_bad_mappings() {
    solr2es()
        .args(["validate", "--mappings", "{not json"])
        .assert()
        .failure();
}

#[test]
fn test_validate_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        "destination:\n  index: from-file\noptions:\n  mode: cooperative\n",
    )
    .unwrap();

    solr2es()
        .arg("validate")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("from-file"))
        .stdout(predicate::str::contains("Cooperative"));
}
