//! Error bodies returned by the API on non-2xx responses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error category derived from the HTTP status of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 400 / 422: the request was malformed.
    InvalidRequest,
    /// 401 / 403: the credential was rejected.
    Authentication,
    /// 404: the referenced response does not exist.
    NotFound,
    /// 429: rate limited or out of quota.
    RateLimited,
    /// 5xx: the service failed.
    Server,
    /// Anything else.
    Other,
}

impl ErrorKind {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ErrorKind::InvalidRequest,
            401 | 403 => ErrorKind::Authentication,
            404 => ErrorKind::NotFound,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Other,
        }
    }

    /// Whether the same call may succeed if repeated later.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::Server)
    }
}

/// Envelope of an error response: `{"error": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiError,
}

/// Error details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Single-line human-readable message.
    pub message: String,
    /// Error type, e.g. `invalid_request_error`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Offending parameter, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    /// Machine-readable code, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    /// Create an error with a type and message.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: Some(kind.into()),
            param: None,
            code: None,
        }
    }

    /// The error the API returns for an unknown response id.
    pub fn not_found(response_id: &str) -> Self {
        Self::new(
            "invalid_request_error",
            format!("No response found with id '{}'.", response_id),
        )
    }

    /// A malformed request.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new("invalid_request_error", message)
    }

    /// A rejected credential.
    pub fn invalid_api_key() -> Self {
        let mut error = Self::new("invalid_request_error", "Incorrect API key provided.");
        error.code = Some("invalid_api_key".to_string());
        error
    }

    /// A rate-limit rejection.
    pub fn rate_limited() -> Self {
        let mut error = Self::new("requests", "Rate limit reached, please try again later.");
        error.code = Some("rate_limit_exceeded".to_string());
        error
    }

    /// An internal service failure.
    pub fn server_error() -> Self {
        Self::new("server_error", "The server had an error while processing your request.")
    }

    /// Wrap into the `{"error": ...}` envelope.
    pub fn into_body(self) -> ApiErrorBody {
        ApiErrorBody { error: self }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_status() {
        assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Authentication);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::Server);
        assert!(ErrorKind::from_status(429).is_transient());
        assert!(!ErrorKind::from_status(400).is_transient());
    }

    #[test]
    fn test_error_body_round_trip_keeps_type_field() {
        let body = ApiError::not_found("resp_missing").into_body();
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["error"]["type"], "invalid_request_error");
        let parsed: ApiErrorBody = serde_json::from_value(value).unwrap();
        assert!(parsed.error.message.contains("resp_missing"));
    }
}
