//! Deep Research - background research jobs from the command line
//!
//! This crate submits long-running "deep research" requests to a
//! Responses-style API, polls them on demand, downloads finished reports
//! into a notes vault as Markdown and rewrites trailing citations into
//! inline links.

pub mod config;
pub mod credentials;
pub mod env;
pub mod error;
pub mod host;
pub mod job;
pub mod mock;
pub mod model;
pub mod prompts;
pub mod report;
pub mod signal;
pub mod state;
pub mod wait;

pub use config::EffectiveConfig;
pub use credentials::{Credential, CredentialRequest, CredentialSource};
pub use env::Environment;
pub use error::{FailureKind, ResearchError, Result};
pub use host::{HttpTransport, MockTransport, ResearchClient, Transport};
pub use job::{JobHandle, JobRequest, JobStatus};
pub use model::ModelTier;
pub use prompts::{PromptLibrary, Template};
pub use report::{DownloadOutcome, DownloadTarget, ResearchReport};
pub use state::JobState;
pub use wait::{wait_until_terminal, WaitPolicy};
