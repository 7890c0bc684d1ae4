//! Response body types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Incomplete,
    /// Any state this client does not know about.
    #[serde(other)]
    Unknown,
}

impl ResponseStatus {
    /// Whether the API will never move the response out of this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResponseStatus::Completed
                | ResponseStatus::Failed
                | ResponseStatus::Cancelled
                | ResponseStatus::Incomplete
        )
    }

    /// Wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Queued => "queued",
            ResponseStatus::InProgress => "in_progress",
            ResponseStatus::Completed => "completed",
            ResponseStatus::Failed => "failed",
            ResponseStatus::Cancelled => "cancelled",
            ResponseStatus::Incomplete => "incomplete",
            ResponseStatus::Unknown => "unknown",
        }
    }
}

/// A response object as returned by create and retrieve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseObject {
    /// Opaque response identifier (`resp_...`).
    pub id: String,
    /// Current lifecycle state.
    pub status: ResponseStatus,
    /// Unix timestamp (seconds) of creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Model that served the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Output items in generation order.
    #[serde(default)]
    pub output: Vec<OutputItem>,
    /// Token accounting, present once the model has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Failure details when `status` is `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
    /// Reason when `status` is `incomplete`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incomplete_details: Option<IncompleteDetails>,
    /// Metadata supplied at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl ResponseObject {
    /// Text and annotations of the final assistant message, if any.
    pub fn final_text(&self) -> Option<(&str, &[Annotation])> {
        self.output.iter().rev().find_map(|item| match item {
            OutputItem::Message { content } => content.iter().find_map(|part| match part {
                ContentPart::OutputText { text, annotations } => {
                    Some((text.as_str(), annotations.as_slice()))
                }
                _ => None,
            }),
            _ => None,
        })
    }

    /// Look up a metadata value.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }

    /// Human-readable failure reason for failed, cancelled or incomplete responses.
    pub fn failure_reason(&self) -> Option<String> {
        match self.status {
            ResponseStatus::Failed => Some(
                self.error
                    .as_ref()
                    .map(|e| match &e.code {
                        Some(code) => format!("{}: {}", code, e.message),
                        None => e.message.clone(),
                    })
                    .unwrap_or_else(|| "response failed without error details".to_string()),
            ),
            ResponseStatus::Cancelled => Some("response was cancelled upstream".to_string()),
            ResponseStatus::Incomplete => Some(format!(
                "response incomplete: {}",
                self.incomplete_details
                    .as_ref()
                    .map(|d| d.reason.as_str())
                    .unwrap_or("no reason given")
            )),
            _ => None,
        }
    }
}

/// One item of response output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// Assistant message.
    Message {
        #[serde(default)]
        content: Vec<ContentPart>,
    },
    /// Reasoning, tool calls and other items this client does not read.
    #[serde(other)]
    Other,
}

/// One part of a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    OutputText {
        text: String,
        #[serde(default)]
        annotations: Vec<Annotation>,
    },
    #[serde(other)]
    Other,
}

/// Annotation attached to output text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    /// A web source backing a span of the text.
    UrlCitation {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_index: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_index: Option<usize>,
    },
    #[serde(other)]
    Other,
}

/// Token usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

impl Usage {
    /// Total tokens, computed when the API omitted it.
    pub fn total(&self) -> u64 {
        self.total_tokens
            .unwrap_or(self.input_tokens + self.output_tokens)
    }
}

/// Failure details of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

/// Why a response stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncompleteDetails {
    pub reason: String,
}
