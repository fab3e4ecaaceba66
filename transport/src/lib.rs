//! Delivery of form payloads to the intake backend.
//!
//! # Architecture
//!
//! - [`Transport`] - the boundary the submission controller talks to
//! - [`HttpTransport`] - reqwest implementation posting JSON to the backend
//! - [`reply`] - reply envelope and its mapping to a submission result
//! - [`retry`] - connection-only retry with backoff
//!
//! A transport delivers one payload and hands back the raw [`ServerReply`];
//! deciding what the reply means for the form is [`ServerReply::interpret`]'s
//! job, so alternative transports (tests, offline queues) share it.

pub mod http;
pub mod reply;
pub mod retry;

use std::future::Future;
use std::sync::Arc;

use intake_types::Payload;
use thiserror::Error;

pub use http::{HttpTransport, HttpTransportConfig};
pub use reply::{ReplyBody, ReplyEnvelope, ServerReply};
pub use retry::RetryConfig;

/// Default backend the site's scripts post to.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Failures below the application layer. None of these reach end users
/// verbatim; the controller replaces them with a generic message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0}ms")]
    Timeout(u128),
    #[error("malformed reply body: {0}")]
    MalformedBody(String),
    #[error("invalid endpoint `{0}`")]
    InvalidEndpoint(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Delivers a payload to an endpoint and returns the server's reply.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        endpoint: &str,
        payload: &Payload,
    ) -> impl Future<Output = Result<ServerReply, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        endpoint: &str,
        payload: &Payload,
    ) -> impl Future<Output = Result<ServerReply, TransportError>> + Send {
        self.as_ref().send(endpoint, payload)
    }
}
