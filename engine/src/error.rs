use intake_transport::TransportError;
use intake_types::{ErrorKind, FieldError};
use thiserror::Error;

/// Shown for every transport failure; the underlying error is only logged.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again later.";

const VALIDATION_MESSAGE: &str = "Please correct the highlighted fields.";
const IN_FLIGHT_MESSAGE: &str = "Your submission is already being sent.";
const ABANDONED_MESSAGE: &str = "The form was closed before the submission completed.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("{} field(s) failed validation", .0.len())]
    ValidationFailed(Vec<FieldError>),
    #[error("a submission is already in flight")]
    AlreadyInFlight,
    #[error("transport failure: {0}")]
    TransportFailure(#[source] TransportError),
    #[error("rejected by server: {0}")]
    ApplicationRejected(String),
    #[error("submission abandoned")]
    Abandoned,
}

impl SubmitError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmitError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            SubmitError::AlreadyInFlight => ErrorKind::AlreadyInFlight,
            SubmitError::TransportFailure(_) => ErrorKind::TransportFailure,
            SubmitError::ApplicationRejected(_) => ErrorKind::ApplicationRejected,
            SubmitError::Abandoned => ErrorKind::Abandoned,
        }
    }

    /// Text safe to show the person filling in the form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::ValidationFailed(_) => VALIDATION_MESSAGE.to_string(),
            SubmitError::AlreadyInFlight => IN_FLIGHT_MESSAGE.to_string(),
            SubmitError::TransportFailure(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            SubmitError::ApplicationRejected(message) => message.clone(),
            SubmitError::Abandoned => ABANDONED_MESSAGE.to_string(),
        }
    }
}
