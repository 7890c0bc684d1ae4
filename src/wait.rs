//! Caller-driven polling
//!
//! `ResearchClient::status` never loops. `wait_until_terminal` is the
//! operator-side loop behind the `wait` command: a fixed interval, an
//! attempt cap and Ctrl-C to stop. Transient errors are logged and the
//! loop polls again; nothing else is retried.

use std::time::Duration;

use crate::config::EffectiveConfig;
use crate::error::{ResearchError, Result};
use crate::host::ResearchClient;
use crate::job::{JobHandle, JobStatus};
use crate::signal::Interrupt;
use crate::state::TerminalState;

/// Poll interval and attempt cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub max_attempts: u64,
}

impl WaitPolicy {
    pub fn from_config(config: &EffectiveConfig) -> Self {
        Self {
            interval: config.wait_interval(),
            max_attempts: config.wait_max_attempts(),
        }
    }
}

/// Poll until the job reaches a terminal state.
///
/// `on_poll` sees every successful status with its 1-based attempt number.
/// Returns the terminal status, `WaitExhausted` when the cap is reached, or
/// `Interrupted`.
pub fn wait_until_terminal<F>(
    client: &ResearchClient,
    handle: &JobHandle,
    policy: WaitPolicy,
    interrupt: &Interrupt,
    mut on_poll: F,
) -> Result<JobStatus>
where
    F: FnMut(&JobStatus, u64),
{
    let mut last_status: Option<JobStatus> = None;
    let mut last_error: Option<ResearchError> = None;

    for attempt in 1..=policy.max_attempts {
        if interrupt.is_set() {
            return Err(ResearchError::Interrupted);
        }

        match client.status(handle) {
            Ok(status) => {
                on_poll(&status, attempt);
                if status.state.is_terminal() {
                    return Ok(status);
                }
                last_status = Some(status);
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!(id = %handle.id, attempt, error = %e, "poll failed, will retry");
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }

        if attempt < policy.max_attempts && !interrupt.sleep(policy.interval) {
            return Err(ResearchError::Interrupted);
        }
    }

    match (last_status, last_error) {
        (Some(status), _) => Err(ResearchError::WaitExhausted {
            id: status.id,
            state: status.state,
            attempts: policy.max_attempts,
        }),
        (None, Some(e)) => Err(e),
        (None, None) => Err(ResearchError::Interrupted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockTransport;
    use crate::job::JobRequest;
    use crate::mock::{FailureConfig, MockApi, MockOp};
    use crate::prompts::PromptLibrary;
    use crate::state::JobState;
    use std::sync::Arc;

    fn setup() -> (ResearchClient, MockApi, JobHandle) {
        let api = MockApi::new();
        let client = ResearchClient::new(
            Arc::new(MockTransport::with_api(api.clone())),
            PromptLibrary::builtin(),
        );
        let request = JobRequest::builder()
            .template("person")
            .topic("Ada Lovelace")
            .build()
            .unwrap();
        let handle = client.submit(&request).unwrap();
        (client, api, handle)
    }

    fn policy(max_attempts: u64) -> WaitPolicy {
        WaitPolicy {
            interval: Duration::ZERO,
            max_attempts,
        }
    }

    #[test]
    fn test_waits_until_completed() {
        let (client, _api, handle) = setup();
        let mut seen = Vec::new();

        let status = wait_until_terminal(&client, &handle, policy(10), &Interrupt::new(), |s, n| {
            seen.push((n, s.state))
        })
        .unwrap();

        assert_eq!(status.state, JobState::Completed);
        assert_eq!(
            seen,
            vec![
                (1, JobState::Queued),
                (2, JobState::Running),
                (3, JobState::Completed)
            ]
        );
    }

    #[test]
    fn test_attempt_cap() {
        let (client, api, handle) = setup();
        api.hold(&handle.id);

        let err = wait_until_terminal(&client, &handle, policy(3), &Interrupt::new(), |_, _| {})
            .unwrap_err();
        assert!(matches!(
            err,
            ResearchError::WaitExhausted {
                state: JobState::Queued,
                attempts: 3,
                ..
            }
        ));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_transient_errors_are_polled_through() {
        let (client, api, handle) = setup();
        api.inject_failure_times(MockOp::Retrieve, FailureConfig::Disconnect, 2);

        let status = wait_until_terminal(&client, &handle, policy(10), &Interrupt::new(), |_, _| {})
            .unwrap();
        assert_eq!(status.state, JobState::Completed);
    }

    #[test]
    fn test_only_transient_failures_returns_last_error() {
        let (client, api, handle) = setup();
        api.inject_failure(MockOp::Retrieve, FailureConfig::server_error());

        let err = wait_until_terminal(&client, &handle, policy(2), &Interrupt::new(), |_, _| {})
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unknown_job_stops_immediately() {
        let (client, api, _handle) = setup();
        let missing = JobHandle::from_id("resp_missing").unwrap();

        let err = wait_until_terminal(&client, &missing, policy(5), &Interrupt::new(), |_, _| {})
            .unwrap_err();
        assert!(matches!(err, ResearchError::UnknownJob(_)));
        // submit + one retrieve
        assert_eq!(api.request_count(), 2);
    }

    #[test]
    fn test_interrupt_leaves_job_alone() {
        let (client, api, handle) = setup();
        api.hold(&handle.id);
        let interrupt = Interrupt::new();

        let err = wait_until_terminal(&client, &handle, policy(100), &interrupt, |_, n| {
            if n == 2 {
                interrupt.trigger();
            }
        })
        .unwrap_err();

        assert!(matches!(err, ResearchError::Interrupted));
        assert_eq!(err.exit_code(), 80);
        assert_eq!(
            api.status_of(&handle.id),
            Some(research_protocol::ResponseStatus::Queued)
        );
    }
}
