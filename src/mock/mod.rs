//! Mock Responses API
//!
//! In-process stand-in for the remote API, used by unit and integration
//! tests through `MockTransport`.
//!
//! # Behaviour
//!
//! - `POST responses`: accept a background request, return it `queued`
//! - `GET responses/{id}`: return the job, advancing it one step along its
//!   progression every `polls_per_step` retrievals
//! - unknown ids: 404 with the API's error body
//! - optional bearer-key check: 401 on mismatch
//! - failure injection per operation (HTTP errors or dropped connections)

mod api;
mod failure;
mod state;

pub use api::{MockApi, RecordedRequest};
pub use failure::{FailureConfig, FailureInjector, MockOp};
pub use state::{MockJob, Outcome};
