//! Rewrite options.

use serde::{Deserialize, Serialize};

/// Knobs for a rewrite pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteOptions {
    /// Drop later citations of the same URL for the same fact.
    #[serde(default = "default_true")]
    pub dedupe: bool,

    /// Maximum characters of context kept in skipped-citation log entries.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

fn default_true() -> bool {
    true
}

fn default_snippet_chars() -> usize {
    60
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            dedupe: true,
            snippet_chars: default_snippet_chars(),
        }
    }
}

/// A citation known from response metadata: a byte span of the text and
/// the URL it points to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    /// Byte offset where the cited span starts.
    pub start: usize,
    /// Byte offset one past the end of the cited span.
    pub end: usize,
    /// Source URL.
    pub url: String,
    /// Source title, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SourceCitation {
    pub fn new(start: usize, end: usize, url: impl Into<String>) -> Self {
        Self {
            start,
            end,
            url: url.into(),
            title: None,
        }
    }

    /// Whether the span lies entirely inside `[lo, hi)`.
    pub(crate) fn within(&self, lo: usize, hi: usize) -> bool {
        self.start <= self.end && self.start >= lo && self.end <= hi
    }
}
