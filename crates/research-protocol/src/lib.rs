//! Research Protocol Types
//!
//! Defines the JSON bodies exchanged with the remote Responses API when a
//! research job runs in background mode.

pub mod error;
pub mod request;
pub mod response;

pub use error::{ApiError, ApiErrorBody, ErrorKind};
pub use request::{CreateResponseRequest, Tool};
pub use response::{
    Annotation, ContentPart, IncompleteDetails, OutputItem, ResponseError, ResponseObject,
    ResponseStatus, Usage,
};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Collection path for response objects, relative to the API root.
pub const RESPONSES_PATH: &str = "responses";

/// Maximum length of a single metadata value accepted by the API.
pub const METADATA_VALUE_MAX_CHARS: usize = 512;

/// Maximum number of metadata entries accepted by the API.
pub const METADATA_MAX_ENTRIES: usize = 16;
