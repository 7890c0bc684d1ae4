//! Mock API request handling

use chrono::Utc;
use research_protocol::{
    Annotation, ApiError, CreateResponseRequest, ResponseObject, ResponseStatus, Usage,
    RESPONSES_PATH,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::host::transport::{ApiReply, ApiRequest, Method, TransportError};

use super::failure::{FailureConfig, FailureInjector, MockOp};
use super::state::{MockJob, Outcome};

/// A request as seen by the mock, for assertions
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug)]
struct Inner {
    jobs: HashMap<String, MockJob>,
    failures: FailureInjector,
    requests: Vec<RecordedRequest>,
    expected_key: Option<String>,
    polls_per_step: u32,
    default_outcome: Outcome,
}

/// Configurable mock Responses API. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct MockApi {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                jobs: HashMap::new(),
                failures: FailureInjector::new(),
                requests: Vec::new(),
                expected_key: None,
                polls_per_step: 1,
                default_outcome: default_report(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // === Test configuration ===

    /// Reject requests whose bearer key differs from `key`
    pub fn require_api_key(&self, key: impl Into<String>) {
        self.lock().expected_key = Some(key.into());
    }

    /// Advance jobs one step every `n` retrievals (default 1, minimum 1)
    pub fn set_polls_per_step(&self, n: u32) {
        self.lock().polls_per_step = n.max(1);
    }

    /// Outcome for jobs created from now on
    pub fn set_default_outcome(&self, outcome: Outcome) {
        self.lock().default_outcome = outcome;
    }

    /// Outcome for one existing job; applies when it reaches its terminal step
    pub fn set_outcome(&self, id: &str, outcome: Outcome) {
        if let Some(job) = self.lock().jobs.get_mut(id) {
            job.outcome = outcome;
        }
    }

    pub fn inject_failure(&self, op: MockOp, config: FailureConfig) {
        self.lock().failures.inject(op, config);
    }

    pub fn inject_failure_times(&self, op: MockOp, config: FailureConfig, count: u32) {
        self.lock().failures.inject_times(op, config, count);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Freeze a job in its current state
    pub fn hold(&self, id: &str) {
        if let Some(job) = self.lock().jobs.get_mut(id) {
            job.held = true;
        }
    }

    pub fn release(&self, id: &str) {
        if let Some(job) = self.lock().jobs.get_mut(id) {
            job.held = false;
        }
    }

    /// Move a job straight to its outcome
    pub fn finish(&self, id: &str) {
        if let Some(job) = self.lock().jobs.get_mut(id) {
            job.finish();
        }
    }

    /// Current remote state of a job
    pub fn status_of(&self, id: &str) -> Option<ResponseStatus> {
        self.lock().jobs.get(id).map(MockJob::status)
    }

    pub fn job_ids(&self) -> Vec<String> {
        self.lock().jobs.keys().cloned().collect()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    // === Request handling ===

    /// Serve one request.
    pub fn handle(
        &self,
        request: &ApiRequest,
        api_key: Option<&str>,
    ) -> Result<ApiReply, TransportError> {
        let mut inner = self.lock();
        inner.requests.push(RecordedRequest {
            method: request.method,
            path: request.path.clone(),
            body: request.body.clone(),
        });

        let op = match route(request) {
            Some(op) => op,
            None => {
                return Ok(error_reply(
                    404,
                    ApiError::invalid_request(format!(
                        "Unknown route {} /{}",
                        request.method.as_str(),
                        request.path
                    )),
                ))
            }
        };

        if let Some(expected) = &inner.expected_key {
            if api_key != Some(expected.as_str()) {
                return Ok(error_reply(401, ApiError::invalid_api_key()));
            }
        }

        if let Some(failure) = inner.failures.check(op.kind()) {
            return match failure {
                FailureConfig::Http { status, error } => Ok(error_reply(status, error)),
                FailureConfig::Disconnect => Err(TransportError::ConnectionFailed(
                    "connection reset by peer".to_string(),
                )),
                FailureConfig::Timeout => Err(TransportError::Timeout),
            };
        }

        Ok(match op {
            Route::Create => inner.create(request.body.as_ref()),
            Route::Retrieve(id) => inner.retrieve(&id),
        })
    }
}

enum Route {
    Create,
    Retrieve(String),
}

impl Route {
    fn kind(&self) -> MockOp {
        match self {
            Route::Create => MockOp::Create,
            Route::Retrieve(_) => MockOp::Retrieve,
        }
    }
}

fn route(request: &ApiRequest) -> Option<Route> {
    let path = request.path.trim_matches('/');
    match (request.method, path.split_once('/')) {
        (Method::Post, None) if path == RESPONSES_PATH => Some(Route::Create),
        (Method::Get, Some((collection, id)))
            if collection == RESPONSES_PATH && !id.is_empty() && !id.contains('/') =>
        {
            Some(Route::Retrieve(id.to_string()))
        }
        _ => None,
    }
}

impl Inner {
    fn create(&mut self, body: Option<&serde_json::Value>) -> ApiReply {
        let request = match body.cloned().map(serde_json::from_value::<CreateResponseRequest>) {
            Some(Ok(request)) => request,
            Some(Err(e)) => {
                return error_reply(400, ApiError::invalid_request(format!("Invalid body: {}", e)))
            }
            None => return error_reply(400, ApiError::invalid_request("Missing body")),
        };
        if request.input.trim().is_empty() {
            return error_reply(400, ApiError::invalid_request("Input must not be empty"));
        }

        let id = format!("resp_{}", uuid::Uuid::new_v4().simple());
        let response = ResponseObject {
            id: id.clone(),
            status: ResponseStatus::Queued,
            created_at: Some(Utc::now().timestamp()),
            model: Some(request.model),
            output: Vec::new(),
            usage: None,
            error: None,
            incomplete_details: None,
            metadata: Some(request.metadata),
        };
        let outcome = self.default_outcome.clone();

        let reply = ApiReply::json(200, &response);
        self.jobs.insert(id, MockJob::new(response, outcome));
        reply
    }

    fn retrieve(&mut self, id: &str) -> ApiReply {
        let polls_per_step = self.polls_per_step;
        let Some(job) = self.jobs.get_mut(id) else {
            return error_reply(404, ApiError::not_found(id));
        };

        // Reply with the current state, then advance for the next poll
        let reply = ApiReply::json(200, &job.response);
        if !job.held && !job.status().is_terminal() {
            job.polls_since_step += 1;
            if job.polls_since_step >= polls_per_step {
                job.advance();
            }
        }
        reply
    }
}

fn error_reply(status: u16, error: ApiError) -> ApiReply {
    ApiReply::json(status, &error.into_body())
}

/// Report served by completed jobs unless configured otherwise.
fn default_report() -> Outcome {
    let text = "## Summary\n\n\
        Acme Robotics raised $10 million in March 2024 ([TechNews](https://technews.example/acme-series-a)). \
        The $10 million round was led by Example Ventures (https://technews.example/acme-series-a).\n\n\
        Revenue grew 40%. (data.example/acme)\n"
        .to_string();

    let annotations = ["https://technews.example/acme-series-a", "data.example/acme"]
        .iter()
        .filter_map(|url| {
            let start = text.find(url)?;
            Some(Annotation::UrlCitation {
                url: url.to_string(),
                title: Some("Acme coverage".to_string()),
                start_index: Some(text[..start].chars().count()),
                end_index: Some(text[..start + url.len()].chars().count()),
            })
        })
        .collect();

    Outcome::Complete {
        text,
        annotations,
        usage: Usage {
            input_tokens: 120_000,
            output_tokens: 8_000,
            total_tokens: Some(128_000),
        },
    }
}
