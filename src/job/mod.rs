//! Job request, handle and status
//!
//! A `JobRequest` is validated by its builder before any network call. The
//! remote API is the only job registry: a `JobHandle` is just the id it
//! returned, and a `JobStatus` is recomputed from every poll.

use chrono::{DateTime, TimeZone, Utc};
use research_protocol::{CreateResponseRequest, ResponseObject, Usage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ResearchError, Result};
use crate::model::ModelTier;
use crate::prompts::{PromptLibrary, Template};
use crate::state::JobState;

/// Metadata keys attached to the remote job at submit time.
pub mod metadata {
    pub const TEMPLATE: &str = "template";
    pub const TOPIC: &str = "topic";
    pub const MODEL_TIER: &str = "model_tier";
    pub const OUTPUT_DIR: &str = "output_dir";
}

/// Longest id accepted from the command line.
const MAX_JOB_ID_LEN: usize = 128;

/// A validated research request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRequest {
    pub template: Template,
    /// Topic, or the full query for `custom`. Trimmed, never empty.
    pub topic: String,
    pub model: ModelTier,
    /// Where `download` should put the report by default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl JobRequest {
    pub fn builder() -> JobRequestBuilder {
        JobRequestBuilder::default()
    }

    /// Assemble the API request body.
    pub fn to_api_request(&self, prompts: &PromptLibrary) -> Result<CreateResponseRequest> {
        let input = prompts.render(self.template, &self.topic)?;
        let mut request = CreateResponseRequest::background(self.model.api_model(), input)
            .with_metadata(metadata::TEMPLATE, self.template.as_str())
            .with_metadata(metadata::TOPIC, &self.topic)
            .with_metadata(metadata::MODEL_TIER, self.model.as_str());
        if let Some(path) = &self.output_path {
            request = request.with_metadata(metadata::OUTPUT_DIR, &path.to_string_lossy());
        }
        Ok(request)
    }
}

/// Builder for [`JobRequest`]
#[derive(Debug, Default)]
pub struct JobRequestBuilder {
    template: Option<String>,
    topic: Option<String>,
    model: Option<ModelTier>,
    output_path: Option<PathBuf>,
}

impl JobRequestBuilder {
    /// Template name (default: company)
    pub fn template(mut self, name: impl Into<String>) -> Self {
        self.template = Some(name.into());
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn model(mut self, model: ModelTier) -> Self {
        self.model = Some(model);
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Validate and build.
    ///
    /// The topic is checked first, so an empty topic reports `EmptyTopic`
    /// even when the template name is also bad.
    pub fn build(self) -> Result<JobRequest> {
        let topic = self.topic.as_deref().map(str::trim).unwrap_or_default();
        if topic.is_empty() {
            return Err(ResearchError::EmptyTopic);
        }

        let template = match self.template.as_deref() {
            Some(name) => name.parse()?,
            None => Template::Company,
        };

        Ok(JobRequest {
            template,
            topic: topic.to_string(),
            model: self.model.unwrap_or_default(),
            output_path: self.output_path,
        })
    }
}

/// Validate a job id before it is embedded in a URL path.
///
/// Ids are 1-128 ASCII alphanumerics, `_` or `-`.
pub fn validate_job_id(id: &str) -> Result<()> {
    let ok = !id.is_empty()
        && id.len() <= MAX_JOB_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(ResearchError::InvalidJobId(id.to_string()))
    }
}

/// The token for later polls and downloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: String,
    /// Known when the handle came from a submit; unknown when rebuilt from
    /// a bare id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl JobHandle {
    /// Handle for an id the API just returned.
    pub fn submitted(id: impl Into<String>, submitted_at: DateTime<Utc>) -> Result<Self> {
        let id = id.into();
        validate_job_id(&id).map_err(|_| {
            ResearchError::Protocol(format!("API returned an unusable response id '{}'", id))
        })?;
        Ok(Self {
            id,
            submitted_at: Some(submitted_at),
        })
    }

    /// Handle for an id given by the operator.
    pub fn from_id(id: &str) -> Result<Self> {
        let id = id.trim();
        validate_job_id(id)?;
        Ok(Self {
            id: id.to_string(),
            submitted_at: None,
        })
    }
}

/// Snapshot of one poll.
///
/// Contains only remote facts, so two polls with no state change compare
/// equal. Elapsed time is derived on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub id: String,
    pub state: JobState,
    /// Raw remote state, e.g. `in_progress` or `cancelled`.
    pub remote_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl JobStatus {
    pub fn from_response(response: &ResponseObject) -> Self {
        Self {
            id: response.id.clone(),
            state: JobState::from_remote(response.status),
            remote_status: response.status.as_str().to_string(),
            model: response.model.clone(),
            usage: response.usage,
            created_at: response.created_at.and_then(timestamp),
            failure_reason: response.failure_reason(),
            template: response.metadata_value(metadata::TEMPLATE).map(str::to_string),
            topic: response.metadata_value(metadata::TOPIC).map(str::to_string),
        }
    }

    /// Time since the job was created upstream.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.created_at
            .and_then(|created| (now - created).to_std().ok())
    }
}

/// Unix seconds to UTC.
pub(crate) fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}
