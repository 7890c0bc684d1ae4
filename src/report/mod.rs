//! Finished research reports
//!
//! A `ResearchReport` is the final message of a completed job plus its URL
//! citations. It renders to a Markdown artifact with frontmatter and a
//! sources list, and can have its trailing citations inlined before
//! writing.

mod download;
mod render;

pub use download::{download, file_name, DownloadOutcome, DownloadTarget, UsageStats};
pub use render::{render_markdown, slug};

use chrono::{DateTime, Utc};
use research_citations::{rewrite_citations_with, Rewrite, RewriteOptions, SourceCitation};
use research_protocol::{Annotation, ResponseObject, Usage};
use serde::{Deserialize, Serialize};

use crate::error::{ResearchError, Result};
use crate::job::{metadata, timestamp};
use crate::model::ModelTier;

/// One URL citation of the report text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Byte range of the cited claim in `ResearchReport::text`, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<(usize, usize)>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Final artifact of a completed job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    pub id: String,
    pub text: String,
    /// Citations in the order the API listed them
    pub citations: Vec<Citation>,
    /// API model id that served the job
    pub model: String,
    pub template: Option<String>,
    pub topic: Option<String>,
    pub usage: Usage,
    pub created_at: Option<DateTime<Utc>>,
    /// Output directory requested at submit time
    pub output_dir: Option<String>,
}

impl ResearchReport {
    /// Extract the report from a completed response.
    pub fn from_response(response: &ResponseObject) -> Result<Self> {
        let (text, annotations) = response.final_text().ok_or_else(|| {
            ResearchError::Protocol(format!(
                "response {} has no output text",
                response.id
            ))
        })?;

        let offsets = char_offsets(text);
        let citations = annotations
            .iter()
            .filter_map(|annotation| match annotation {
                Annotation::UrlCitation {
                    url,
                    title,
                    start_index,
                    end_index,
                } if !url.is_empty() => Some(Citation {
                    span: byte_span(&offsets, *start_index, *end_index),
                    url: url.clone(),
                    title: title.clone().filter(|t| !t.trim().is_empty()),
                }),
                _ => None,
            })
            .collect();

        let model = response
            .model
            .clone()
            .or_else(|| {
                response
                    .metadata_value(metadata::MODEL_TIER)
                    .and_then(|tier| tier.parse::<ModelTier>().ok())
                    .map(|tier| tier.api_model().to_string())
            })
            .unwrap_or_else(|| ModelTier::default().api_model().to_string());

        Ok(Self {
            id: response.id.clone(),
            text: text.to_string(),
            citations,
            model,
            template: response.metadata_value(metadata::TEMPLATE).map(str::to_string),
            topic: response.metadata_value(metadata::TOPIC).map(str::to_string),
            usage: response.usage.unwrap_or_default(),
            created_at: response.created_at.and_then(timestamp),
            output_dir: response
                .metadata_value(metadata::OUTPUT_DIR)
                .map(str::to_string),
        })
    }

    /// Unique sources by URL, first-seen order.
    pub fn sources(&self) -> Vec<&Citation> {
        let mut seen = std::collections::HashSet::new();
        self.citations
            .iter()
            .filter(|c| seen.insert(c.url.as_str()))
            .collect()
    }

    /// Citations with a known span, for the rewriter.
    pub fn source_citations(&self) -> Vec<SourceCitation> {
        self.citations
            .iter()
            .filter_map(|c| {
                let (start, end) = c.span?;
                Some(SourceCitation {
                    start,
                    end,
                    url: c.url.clone(),
                    title: c.title.clone(),
                })
            })
            .collect()
    }

    /// Rewrite trailing citations into inline links.
    ///
    /// Spans no longer match the rewritten text, so they are cleared; the
    /// sources list is unaffected.
    pub fn inline_citations(&mut self, options: &RewriteOptions) -> Rewrite {
        let rewrite = rewrite_citations_with(&self.text, &self.source_citations(), options);
        if rewrite.changed() {
            tracing::info!(
                id = %self.id,
                rewritten = rewrite.rewritten,
                deduplicated = rewrite.deduplicated,
                "citations inlined"
            );
            self.text = rewrite.text.clone();
            for citation in &mut self.citations {
                citation.span = None;
            }
        }
        rewrite
    }
}

/// Byte offset of every char boundary, including the end of the text.
fn char_offsets(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect()
}

/// Convert an API character span to a byte span; out-of-range spans are dropped.
fn byte_span(offsets: &[usize], start: Option<usize>, end: Option<usize>) -> Option<(usize, usize)> {
    let (start, end) = (start?, end?);
    if start > end {
        return None;
    }
    Some((*offsets.get(start)?, *offsets.get(end)?))
}
