//! Error taxonomy and exit-code mapping

use std::io;

use crate::config::ConfigError;
use crate::state::JobState;

/// Failure kind for exit code mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Bad template, topic, model, job id or profile name (exit code 2)
    Usage = 2,
    /// No usable API key (exit code 3)
    Credentials = 3,
    /// The API does not know the job (exit code 4)
    UnknownJob = 4,
    /// Job still queued or running (exit code 5)
    NotReady = 5,
    /// Job ended in failure upstream (exit code 6)
    FailedUpstream = 6,
    /// Network trouble, rate limits, server errors (exit code 20)
    Transient = 20,
    /// Non-retryable API or protocol errors (exit code 30)
    Api = 30,
    /// Local config and filesystem errors (exit code 40)
    Local = 40,
    /// Polling interrupted by the operator (exit code 80)
    Interrupted = 80,
}

/// Errors surfaced by the research workflow
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("unknown template '{name}' (available: {available})")]
    InvalidTemplate { name: String, available: String },

    #[error("unknown model '{0}' (available: high-quality, economy)")]
    InvalidModel(String),

    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("invalid job id '{0}'")]
    InvalidJobId(String),

    #[error("profile '{name}' not found (available: {available})")]
    UnknownProfile { name: String, available: String },

    #[error("no API key found: {0}")]
    MissingCredential(String),

    #[error("API key rejected: {0}")]
    Unauthorized(String),

    #[error("unknown job '{0}'")]
    UnknownJob(String),

    #[error("job {id} is not ready (state: {state})")]
    JobNotReady { id: String, state: JobState },

    #[error("job {id} failed upstream: {reason}")]
    JobFailedUpstream { id: String, reason: String },

    #[error("transient network error: {0}")]
    TransientNetworkError(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("job {id} still {state} after {attempts} polls")]
    WaitExhausted {
        id: String,
        state: JobState,
        attempts: u64,
    },

    #[error("interrupted")]
    Interrupted,

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ResearchError {
    /// Map error to failure kind for exit code
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ResearchError::InvalidTemplate { .. }
            | ResearchError::InvalidModel(_)
            | ResearchError::EmptyTopic
            | ResearchError::InvalidJobId(_)
            | ResearchError::UnknownProfile { .. } => FailureKind::Usage,
            ResearchError::MissingCredential(_) | ResearchError::Unauthorized(_) => {
                FailureKind::Credentials
            }
            ResearchError::UnknownJob(_) => FailureKind::UnknownJob,
            ResearchError::JobNotReady { .. } | ResearchError::WaitExhausted { .. } => {
                FailureKind::NotReady
            }
            ResearchError::JobFailedUpstream { .. } => FailureKind::FailedUpstream,
            ResearchError::TransientNetworkError(_) => FailureKind::Transient,
            ResearchError::Api { .. } | ResearchError::Protocol(_) => FailureKind::Api,
            ResearchError::Config(_) | ResearchError::Io(_) => FailureKind::Local,
            ResearchError::Interrupted => FailureKind::Interrupted,
        }
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> i32 {
        self.failure_kind() as i32
    }

    /// Whether the same call may succeed if repeated later.
    ///
    /// Only transient network failures qualify; the tool never retries on
    /// its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ResearchError::TransientNetworkError(_))
    }
}

/// Result type for research operations
pub type Result<T> = std::result::Result<T, ResearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ResearchError::EmptyTopic.exit_code(), 2);
        assert_eq!(ResearchError::MissingCredential("x".into()).exit_code(), 3);
        assert_eq!(ResearchError::UnknownJob("resp_1".into()).exit_code(), 4);
        assert_eq!(
            ResearchError::JobNotReady {
                id: "resp_1".into(),
                state: JobState::Running
            }
            .exit_code(),
            5
        );
        assert_eq!(
            ResearchError::JobFailedUpstream {
                id: "resp_1".into(),
                reason: "boom".into()
            }
            .exit_code(),
            6
        );
        assert_eq!(ResearchError::TransientNetworkError("reset".into()).exit_code(), 20);
        assert_eq!(ResearchError::Protocol("bad json".into()).exit_code(), 30);
        assert_eq!(ResearchError::Interrupted.exit_code(), 80);
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(ResearchError::TransientNetworkError("timeout".into()).is_retryable());
        assert!(!ResearchError::UnknownJob("resp_1".into()).is_retryable());
        assert!(!ResearchError::Api {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_upstream_message_kept_verbatim() {
        let err = ResearchError::JobFailedUpstream {
            id: "resp_1".into(),
            reason: "server_error: The model crashed".into(),
        };
        assert!(err.to_string().ends_with("server_error: The model crashed"));
    }
}
