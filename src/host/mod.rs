//! Host-side API access
//!
//! The client speaks to the remote Responses API through a `Transport`, so
//! tests can swap the HTTP transport for the in-process mock.

pub mod client;
pub mod transport;

pub use client::ResearchClient;
pub use transport::{ApiReply, ApiRequest, HttpTransport, Method, MockTransport, Transport, TransportError};
