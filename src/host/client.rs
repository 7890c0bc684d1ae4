//! Research API client
//!
//! One blocking round-trip per call. Maps HTTP statuses and API error
//! bodies onto `ResearchError`; never retries on its own.

use chrono::Utc;
use research_protocol::{ApiErrorBody, ErrorKind, ResponseObject, RESPONSES_PATH};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::error::{ResearchError, Result};
use crate::job::{JobHandle, JobRequest, JobStatus};
use crate::prompts::PromptLibrary;
use crate::report::ResearchReport;
use crate::state::JobState;

use super::transport::{ApiReply, ApiRequest, Transport, TransportError};

/// Client for the background Responses API
pub struct ResearchClient {
    transport: Arc<dyn Transport>,
    prompts: PromptLibrary,
}

impl ResearchClient {
    pub fn new(transport: Arc<dyn Transport>, prompts: PromptLibrary) -> Self {
        Self { transport, prompts }
    }

    /// Submit a research job. Prompt assembly happens before any request.
    pub fn submit(&self, request: &JobRequest) -> Result<JobHandle> {
        let body = request.to_api_request(&self.prompts)?;
        let body = serde_json::to_value(&body)
            .map_err(|e| ResearchError::Protocol(format!("cannot encode request: {}", e)))?;

        let response: ResponseObject =
            self.call(&ApiRequest::post(RESPONSES_PATH, body), None)?;

        let submitted_at = response
            .created_at
            .and_then(crate::job::timestamp)
            .unwrap_or_else(Utc::now);
        let handle = JobHandle::submitted(response.id, submitted_at)?;

        tracing::info!(
            id = %handle.id,
            template = %request.template,
            model = %request.model,
            status = response.status.as_str(),
            "research job submitted"
        );
        Ok(handle)
    }

    /// Fetch the remote response object for a job.
    fn retrieve(&self, handle: &JobHandle) -> Result<ResponseObject> {
        let path = format!("{}/{}", RESPONSES_PATH, handle.id);
        self.call(&ApiRequest::get(path), Some(&handle.id))
    }

    /// Query current job status once.
    pub fn status(&self, handle: &JobHandle) -> Result<JobStatus> {
        let status = JobStatus::from_response(&self.retrieve(handle)?);
        tracing::info!(id = %status.id, state = %status.state, "job status");
        Ok(status)
    }

    /// Fetch the final report of a completed job.
    pub fn fetch_report(&self, handle: &JobHandle) -> Result<ResearchReport> {
        let response = self.retrieve(handle)?;
        let status = JobStatus::from_response(&response);

        match status.state {
            JobState::Completed => ResearchReport::from_response(&response),
            JobState::Failed => Err(ResearchError::JobFailedUpstream {
                id: status.id,
                reason: status
                    .failure_reason
                    .unwrap_or_else(|| "no failure reason given".to_string()),
            }),
            state => Err(ResearchError::JobNotReady {
                id: status.id,
                state,
            }),
        }
    }

    fn call<T: DeserializeOwned>(&self, request: &ApiRequest, job_id: Option<&str>) -> Result<T> {
        tracing::debug!(method = request.method.as_str(), path = %request.path, "calling API");
        let reply = self.transport.execute(request).map_err(map_transport_error)?;

        if !reply.is_success() {
            return Err(map_error_reply(&reply, job_id));
        }

        serde_json::from_str(&reply.body).map_err(|e| {
            ResearchError::Protocol(format!("undecodable response from {}: {}", request.path, e))
        })
    }
}

pub(crate) fn map_transport_error(e: TransportError) -> ResearchError {
    match e {
        TransportError::Setup(msg) => ResearchError::Protocol(msg),
        other => ResearchError::TransientNetworkError(other.to_string()),
    }
}

/// Map a non-2xx reply to an error.
fn map_error_reply(reply: &ApiReply, job_id: Option<&str>) -> ResearchError {
    let message = serde_json::from_str::<ApiErrorBody>(&reply.body)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| {
            let snippet: String = reply.body.chars().take(200).collect();
            format!("HTTP {}: {}", reply.status, snippet.trim())
        });

    match (ErrorKind::from_status(reply.status), job_id) {
        (ErrorKind::NotFound, Some(id)) => ResearchError::UnknownJob(id.to_string()),
        (ErrorKind::Authentication, _) => ResearchError::Unauthorized(message),
        (kind, _) if kind.is_transient() => ResearchError::TransientNetworkError(message),
        _ => ResearchError::Api {
            status: reply.status,
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockTransport;
    use crate::mock::{FailureConfig, MockApi, MockOp, Outcome};
    use research_protocol::ApiError;

    fn setup() -> (ResearchClient, MockApi) {
        let api = MockApi::new();
        let transport = Arc::new(MockTransport::with_api(api.clone()));
        (ResearchClient::new(transport, PromptLibrary::builtin()), api)
    }

    fn request() -> JobRequest {
        JobRequest::builder()
            .template("company")
            .topic("Acme Robotics")
            .build()
            .unwrap()
    }

    #[test]
    fn test_submit_returns_handle() {
        let (client, api) = setup();
        let handle = client.submit(&request()).unwrap();

        assert!(handle.id.starts_with("resp_"));
        assert!(handle.submitted_at.is_some());

        let sent = api.requests();
        assert_eq!(sent.len(), 1);
        let body = sent[0].body.as_ref().unwrap();
        assert_eq!(body["model"], "o3-deep-research");
        assert_eq!(body["background"], true);
        assert_eq!(body["tools"][0]["type"], "web_search_preview");
        assert_eq!(body["metadata"]["topic"], "Acme Robotics");
    }

    #[test]
    fn test_status_progression() {
        let (client, api) = setup();
        api.set_polls_per_step(2);
        let handle = client.submit(&request()).unwrap();

        let states: Vec<JobState> = (0..6)
            .map(|_| client.status(&handle).unwrap().state)
            .collect();
        assert_eq!(
            states,
            vec![
                JobState::Queued,
                JobState::Queued,
                JobState::Running,
                JobState::Running,
                JobState::Completed,
                JobState::Completed,
            ]
        );
    }

    #[test]
    fn test_unknown_job() {
        let (client, _api) = setup();
        let handle = JobHandle::from_id("resp_nope").unwrap();

        assert!(matches!(
            client.status(&handle),
            Err(ResearchError::UnknownJob(id)) if id == "resp_nope"
        ));
        assert!(matches!(
            client.fetch_report(&handle),
            Err(ResearchError::UnknownJob(_))
        ));
    }

    #[test]
    fn test_fetch_report_not_ready() {
        let (client, api) = setup();
        let handle = client.submit(&request()).unwrap();
        api.hold(&handle.id);

        assert!(matches!(
            client.fetch_report(&handle),
            Err(ResearchError::JobNotReady { state: JobState::Queued, .. })
        ));
    }

    #[test]
    fn test_fetch_report_failed_upstream_verbatim() {
        let (client, api) = setup();
        let handle = client.submit(&request()).unwrap();
        api.set_outcome(
            &handle.id,
            Outcome::Fail {
                code: "server_error".to_string(),
                message: "The model crashed mid-search".to_string(),
            },
        );
        api.finish(&handle.id);

        match client.fetch_report(&handle) {
            Err(ResearchError::JobFailedUpstream { reason, .. }) => {
                assert_eq!(reason, "server_error: The model crashed mid-search")
            }
            other => panic!("unexpected: {:?}", other.map(|r| r.id)),
        }
    }

    #[test]
    fn test_fetch_report_completed() {
        let (client, api) = setup();
        let handle = client.submit(&request()).unwrap();
        api.finish(&handle.id);

        let report = client.fetch_report(&handle).unwrap();
        assert_eq!(report.topic.as_deref(), Some("Acme Robotics"));
        assert_eq!(report.template.as_deref(), Some("company"));
        assert_eq!(report.usage.total(), 128_000);
        assert!(!report.citations.is_empty());
    }

    #[test]
    fn test_transient_errors() {
        let (client, api) = setup();
        let handle = client.submit(&request()).unwrap();

        api.inject_failure_times(MockOp::Retrieve, FailureConfig::rate_limited(), 1);
        let err = client.status(&handle).unwrap_err();
        assert!(err.is_retryable());

        api.inject_failure_times(MockOp::Retrieve, FailureConfig::Timeout, 1);
        assert!(matches!(
            client.status(&handle),
            Err(ResearchError::TransientNetworkError(_))
        ));

        api.inject_failure_times(MockOp::Retrieve, FailureConfig::server_error(), 1);
        assert!(client.status(&handle).unwrap_err().is_retryable());

        // Injected failures are used up
        assert!(client.status(&handle).is_ok());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let (client, api) = setup();
        api.inject_failure(
            MockOp::Create,
            FailureConfig::http(400, ApiError::invalid_request("Unsupported parameter")),
        );

        match client.submit(&request()) {
            Err(ResearchError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Unsupported parameter");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_rejected_key() {
        let api = MockApi::new();
        api.require_api_key("sk-good");
        let transport = Arc::new(MockTransport::with_api(api).with_api_key("sk-bad"));
        let client = ResearchClient::new(transport, PromptLibrary::builtin());

        assert!(matches!(
            client.submit(&request()),
            Err(ResearchError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_repeated_status_is_stable() {
        let (client, api) = setup();
        let handle = client.submit(&request()).unwrap();
        api.hold(&handle.id);

        let first = client.status(&handle).unwrap();
        let second = client.status(&handle).unwrap();
        assert_eq!(first, second);
    }
}
