//! Turns source documents into Elasticsearch bulk actions.
//!
//! For each document two NDJSON lines are emitted: an `index` directive
//! carrying the target index, the optional mapping type and the source `id`,
//! then the document body with every array-valued field collapsed to its
//! first element. Collapsing is lossy and final.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::source::Document;

/// Field holding the destination record key.
pub const ID_FIELD: &str = "id";

/// Per-field rewrite applied to document bodies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldTranslation {
    /// Destination field name.
    #[serde(default)]
    pub name: Option<String>,
    /// Value to use when the source field is absent.
    #[serde(default)]
    pub default: Option<Value>,
}

/// A batch of bulk actions ready to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkBatch {
    /// NDJSON payload, newline-terminated.
    pub body: String,
    /// Destination ids, in payload order.
    pub ids: Vec<String>,
}

impl BulkBatch {
    /// Number of documents in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the batch holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Stateless document-to-bulk-action transformer.
#[derive(Debug, Clone)]
pub struct Transformer {
    doc_type: Option<String>,
    include_id_in_body: bool,
    translations: BTreeMap<String, FieldTranslation>,
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new(Some("doc".to_string()))
    }
}

impl Transformer {
    /// Creates a transformer that writes under the given mapping type.
    pub fn new(doc_type: Option<String>) -> Self {
        Self {
            doc_type,
            include_id_in_body: false,
            translations: BTreeMap::new(),
        }
    }

    /// Keeps or strips the `id` field from bodies.
    #[must_use]
    pub fn with_id_in_body(mut self, include: bool) -> Self {
        self.include_id_in_body = include;
        self
    }

    /// Sets the field translation map.
    #[must_use]
    pub fn with_translations(mut self, translations: BTreeMap<String, FieldTranslation>) -> Self {
        self.translations = translations;
        self
    }

    /// Transforms a page of documents into one NDJSON bulk batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingId`] if a document has no usable `id`.
    pub fn transform(&self, index: &str, documents: &[Document]) -> Result<BulkBatch> {
        let mut batch = BulkBatch {
            body: String::new(),
            ids: Vec::with_capacity(documents.len()),
        };

        for doc in documents {
            let collapsed = collapse_arrays(doc);
            let id = document_id(&collapsed)?;

            let directive = self.directive(index, &id);
            let body = self.body(collapsed);

            batch.body.push_str(&serde_json::to_string(&directive)?);
            batch.body.push('\n');
            batch.body.push_str(&serde_json::to_string(&body)?);
            batch.body.push('\n');
            batch.ids.push(id);
        }

        Ok(batch)
    }

    fn directive(&self, index: &str, id: &str) -> Value {
        let mut action = serde_json::Map::new();
        action.insert("_index".to_string(), json!(index));
        if let Some(doc_type) = &self.doc_type {
            action.insert("_type".to_string(), json!(doc_type));
        }
        action.insert("_id".to_string(), json!(id));
        json!({ "index": action })
    }

    fn body(&self, collapsed: Document) -> Document {
        let mut body = Document::new();

        for (key, value) in collapsed {
            if key == ID_FIELD && !self.include_id_in_body {
                continue;
            }
            let name = self
                .translations
                .get(&key)
                .and_then(|t| t.name.clone())
                .unwrap_or(key);
            body.insert(name, value);
        }

        for (source, translation) in &self.translations {
            let Some(default) = &translation.default else {
                continue;
            };
            let name = translation.name.as_ref().unwrap_or(source);
            if !body.contains_key(name) {
                body.insert(name.clone(), default.clone());
            }
        }

        body
    }
}

/// Replaces every array-valued field by its first element.
///
/// Scalars are left untouched; empty arrays drop the field.
pub fn collapse_arrays(doc: &Document) -> Document {
    doc.iter()
        .filter_map(|(key, value)| match value {
            Value::Array(items) => items.first().map(|first| (key.clone(), first.clone())),
            other => Some((key.clone(), other.clone())),
        })
        .collect()
}

/// Reads the destination id from a collapsed document.
pub(crate) fn document_id(doc: &Document) -> Result<String> {
    match doc.get(ID_FIELD) {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        Some(other) => Err(Error::MissingId(format!("unsupported id value {}", other))),
        None => Err(Error::MissingId(
            serde_json::to_string(doc).unwrap_or_default(),
        )),
    }
}
