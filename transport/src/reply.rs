//! Backend reply model and its interpretation.
//!
//! The backend answers every submission with a JSON body carrying a `status`
//! field (`"success"` or `"error"`) and, on error, an optional `message`.

use intake_types::SubmissionResult;
use serde::{Deserialize, Serialize};

use crate::TransportError;

pub const SUCCESS_STATUS: &str = "success";

/// Longest body excerpt kept for diagnostics when a reply is unreadable.
const MAX_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReplyEnvelope {
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: SUCCESS_STATUS.to_string(),
            message: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }

    fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }

    fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    Json(ReplyEnvelope),
    /// Not JSON, or JSON without a `status`; holds a short excerpt.
    Unreadable(String),
}

/// What the server answered, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerReply {
    pub status: u16,
    pub body: ReplyBody,
}

impl ServerReply {
    #[must_use]
    pub fn new(status: u16, envelope: ReplyEnvelope) -> Self {
        Self {
            status,
            body: ReplyBody::Json(envelope),
        }
    }

    #[must_use]
    pub fn from_bytes(status: u16, bytes: &[u8]) -> Self {
        let body = match serde_json::from_slice::<ReplyEnvelope>(bytes) {
            Ok(envelope) => ReplyBody::Json(envelope),
            Err(_) => {
                let text = String::from_utf8_lossy(bytes);
                ReplyBody::Unreadable(text.chars().take(MAX_EXCERPT_CHARS).collect())
            }
        };
        Self { status, body }
    }

    #[must_use]
    pub fn is_http_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Map the reply to a submission result.
    ///
    /// - 2xx with `status: "success"`: success
    /// - 2xx with any other status: rejected, server message or `fallback`
    /// - 2xx with an unreadable body: transport failure
    /// - non-2xx: rejected, server message or `fallback`
    pub fn interpret(&self, fallback: &str) -> Result<SubmissionResult, TransportError> {
        match (&self.body, self.is_http_success()) {
            (ReplyBody::Json(envelope), true) if envelope.is_success() => {
                Ok(SubmissionResult::Success)
            }
            (ReplyBody::Json(envelope), _) => Ok(SubmissionResult::Failure(
                envelope.message().unwrap_or(fallback).to_string(),
            )),
            (ReplyBody::Unreadable(excerpt), true) => {
                Err(TransportError::MalformedBody(excerpt.clone()))
            }
            (ReplyBody::Unreadable(_), false) => {
                Ok(SubmissionResult::Failure(fallback.to_string()))
            }
        }
    }
}
