//! Transport layer for the API client
//!
//! - `Transport`: one request in, one HTTP reply out
//! - `HttpTransport`: blocking HTTPS with bearer auth
//! - `MockTransport`: in-process mock API for tests

use serde_json::Value;
use std::time::Duration;

use crate::credentials::Credential;
use crate::mock::MockApi;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// A request relative to the API root.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, without a leading slash.
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// Raw HTTP reply. Non-2xx statuses are not errors at this layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    pub fn json(status: u16, body: &impl serde::Serialize) -> Self {
        Self {
            status,
            body: serde_json::to_string(body).unwrap_or_default(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport trait for API communication
pub trait Transport: Send + Sync {
    /// Execute a request and return the reply
    fn execute(&self, request: &ApiRequest) -> Result<ApiReply, TransportError>;
}

/// Transport errors: the request never produced an HTTP reply
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

/// Blocking HTTPS transport for production use
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
    credential: Credential,
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        credential: Credential,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("deep-research/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiReply, TransportError> {
        let url = self.url(&request.path);
        tracing::debug!(method = request.method.as_str(), %url, "api request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        }
        .bearer_auth(self.credential.api_key());

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(map_reqwest_error)?;

        tracing::debug!(status, bytes = body.len(), "api reply");
        Ok(ApiReply { status, body })
    }
}

/// Only failures on the wire are transient. A request that could not be
/// built (bad header value, bad URL) fails the same way every time.
fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_builder() {
        TransportError::Setup(e.to_string())
    } else {
        TransportError::ConnectionFailed(e.to_string())
    }
}

/// Mock transport for testing - talks to a `MockApi` in-process
pub struct MockTransport {
    api: MockApi,
    api_key: Option<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_api(MockApi::new())
    }

    pub fn with_api(api: MockApi) -> Self {
        Self { api, api_key: None }
    }

    /// Present this key on every request, as the HTTP transport would.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// The underlying mock API, for test configuration
    pub fn api(&self) -> &MockApi {
        &self.api
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiReply, TransportError> {
        self.api.handle(request, self.api_key.as_deref())
    }
}
