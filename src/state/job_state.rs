//! Job state as exposed by this tool

use research_protocol::ResponseStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::TerminalState;

/// Job state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Accepted upstream, waiting to start
    Queued,
    /// Researching
    Running,
    /// Report available for download
    Completed,
    /// Ended without a report
    Failed,
}

impl TerminalState for JobState {
    fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl JobState {
    /// Map a remote lifecycle state.
    ///
    /// `cancelled` and `incomplete` surface as `Failed`; there is no
    /// cancelled state here. Unknown remote states are treated as still
    /// running so a newer API never makes a live job look finished.
    pub fn from_remote(status: ResponseStatus) -> Self {
        match status {
            ResponseStatus::Queued => JobState::Queued,
            ResponseStatus::InProgress | ResponseStatus::Unknown => JobState::Running,
            ResponseStatus::Completed => JobState::Completed,
            ResponseStatus::Failed | ResponseStatus::Cancelled | ResponseStatus::Incomplete => {
                JobState::Failed
            }
        }
    }

    /// Check if transition from this state to target is valid
    pub fn can_transition_to(&self, target: JobState) -> bool {
        match (self, target) {
            (JobState::Queued, JobState::Running) => true,
            // Jobs can finish between two polls
            (JobState::Queued, JobState::Completed) => true,
            (JobState::Queued, JobState::Failed) => true,

            (JobState::Running, JobState::Completed) => true,
            (JobState::Running, JobState::Failed) => true,

            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
