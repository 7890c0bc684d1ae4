//! Request body types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{METADATA_MAX_ENTRIES, METADATA_VALUE_MAX_CHARS};

/// Body of `POST /responses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateResponseRequest {
    /// Model identifier, e.g. `o3-deep-research`.
    pub model: String,
    /// Fully assembled prompt text.
    pub input: String,
    /// Run the response asynchronously; the create call returns immediately.
    #[serde(default)]
    pub background: bool,
    /// Tools the model may call while researching.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    /// Caller metadata echoed back on every retrieval.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl CreateResponseRequest {
    /// Create a background request with web search enabled.
    pub fn background(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            background: true,
            tools: vec![Tool::WebSearchPreview],
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry, truncating the value to the API limit.
    ///
    /// Entries beyond the API's entry limit are dropped.
    pub fn with_metadata(mut self, key: impl Into<String>, value: &str) -> Self {
        if self.metadata.len() < METADATA_MAX_ENTRIES {
            let value: String = value.chars().take(METADATA_VALUE_MAX_CHARS).collect();
            self.metadata.insert(key.into(), value);
        }
        self
    }
}

/// A tool made available to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    /// Hosted web search.
    WebSearchPreview,
}
