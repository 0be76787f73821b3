//! Configuration types for solr2es.
//!
//! Every field has a default, so the tool runs without a file against the
//! usual docker-compose host names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::destination::elasticsearch::ElasticsearchConfig;
use crate::error::{Error, Result};
use crate::http::validate_url;
use crate::pipeline::PipelineOptions;
use crate::progress::DEFAULT_PROGRESS_EVERY;
use crate::queue::QueueConfig;
use crate::retry::RetryConfig;
use crate::runtime::{CancelFlag, ExecutionMode};
use crate::source::solr::SolrConfig;
use crate::source::WalkGuard;
use crate::transform::{FieldTranslation, Transformer};

/// Main migration configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Solr source configuration.
    #[serde(default)]
    pub source: SolrConfig,
    /// Elasticsearch destination configuration.
    #[serde(default)]
    pub destination: ElasticsearchConfig,
    /// Redis queue configuration.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Migration options.
    #[serde(default)]
    pub options: MigrationOptions,
}

/// Migration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Documents between two progress notifications.
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
    /// Abort after this many page requests.
    #[serde(default)]
    pub max_pages: Option<u64>,
    /// Consecutive empty pages tolerated while the cursor still moves.
    #[serde(default = "default_max_empty_pages")]
    pub max_empty_pages: u32,
    /// Keep the `id` field in indexed bodies.
    #[serde(default)]
    pub include_id_in_body: bool,
    /// Field renames and defaults (`source_field` -> translation).
    #[serde(default)]
    pub field_translations: BTreeMap<String, FieldTranslation>,
    /// Backoff for bulk writes.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Execution model.
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Draw a terminal progress bar.
    #[serde(default)]
    pub show_progress_bar: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            progress_every: default_progress_every(),
            max_pages: None,
            max_empty_pages: default_max_empty_pages(),
            include_id_in_body: false,
            field_translations: BTreeMap::new(),
            retry: RetryConfig::default(),
            mode: ExecutionMode::default(),
            show_progress_bar: false,
        }
    }
}

fn default_progress_every() -> u64 {
    DEFAULT_PROGRESS_EVERY
}

fn default_max_empty_pages() -> u32 {
    WalkGuard::default().max_empty_pages
}

impl MigrationConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Renders the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.source.url, &["http", "https"])?;
        validate_url(&self.destination.url, &["http", "https"])?;
        validate_url(&self.queue.url, &["redis", "rediss", "unix"])?;

        if self.source.rows == 0 {
            return Err(Error::Config("source.rows must be greater than 0".to_string()));
        }
        if self.destination.index.is_empty() {
            return Err(Error::Config("destination.index cannot be empty".to_string()));
        }
        if self.destination.index.chars().any(char::is_uppercase) {
            return Err(Error::Config(format!(
                "destination.index must be lowercase: {}",
                self.destination.index
            )));
        }
        if self.queue.key.is_empty() {
            return Err(Error::Config("queue.key cannot be empty".to_string()));
        }
        if self.queue.batch_size == 0 {
            return Err(Error::Config(
                "queue.batch_size must be greater than 0".to_string(),
            ));
        }
        if self.options.progress_every == 0 {
            return Err(Error::Config(
                "options.progress_every must be greater than 0".to_string(),
            ));
        }
        self.index_body()?;
        Ok(())
    }

    /// Index-creation body built from the destination settings and mappings.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced file cannot be read or holds
    /// invalid JSON.
    pub fn index_body(&self) -> Result<Value> {
        let settings = self.destination.settings.as_ref().map(resolve_json).transpose()?;
        let mappings = self.destination.mappings.as_ref().map(resolve_json).transpose()?;
        Ok(index_body(settings, mappings))
    }

    /// Transformer for the configured type, id policy and translations.
    pub fn transformer(&self) -> Transformer {
        Transformer::new(self.destination.doc_type.clone())
            .with_id_in_body(self.options.include_id_in_body)
            .with_translations(self.options.field_translations.clone())
    }

    /// Pipeline options bound to `cancel`.
    pub fn pipeline_options(&self, cancel: CancelFlag) -> PipelineOptions {
        PipelineOptions {
            guard: WalkGuard {
                max_pages: self.options.max_pages,
                max_empty_pages: self.options.max_empty_pages,
            },
            progress_every: self.options.progress_every,
            show_progress_bar: self.options.show_progress_bar,
            create_index: self.destination.create_index,
            cancel,
        }
    }
}

/// Reads a JSON argument: `None` gives `{}`, `"@path"` reads the file at
/// `path`, anything else is parsed as inline JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is invalid.
pub fn load_json_arg(arg: Option<&str>) -> Result<Value> {
    let Some(arg) = arg else {
        return Ok(Value::Object(Map::new()));
    };

    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read JSON file '{}': {}", path, e))
        })?,
        None => arg.to_string(),
    };

    Ok(serde_json::from_str(&text)?)
}

/// Strings in config files go through [`load_json_arg`]; objects are used as is.
fn resolve_json(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) => load_json_arg(Some(s)),
        other => Ok(other.clone()),
    }
}

/// Builds the index-creation body, omitting absent parts.
pub fn index_body(settings: Option<Value>, mappings: Option<Value>) -> Value {
    let mut body = Map::new();
    if let Some(settings) = settings {
        body.insert("settings".to_string(), settings);
    }
    if let Some(mappings) = mappings {
        body.insert("mappings".to_string(), mappings);
    }
    Value::Object(body)
}
