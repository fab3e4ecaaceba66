//! Submission lifecycle types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of one form's submission attempts.
///
/// ```text
/// Idle ──▶ Validating ──▶ Submitting ──▶ Succeeded
///   ▲          │               │
///   │          └──────────────▶└──────▶ Failed
///   └── abandon() from any state
/// ```
///
/// A new attempt may start from `Idle`, `Succeeded` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl SubmissionStatus {
    #[must_use]
    pub fn can_start(self) -> bool {
        matches!(
            self,
            SubmissionStatus::Idle | SubmissionStatus::Succeeded | SubmissionStatus::Failed
        )
    }

    #[must_use]
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            SubmissionStatus::Validating | SubmissionStatus::Submitting
        )
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    ///
    /// `abandon()` is not an edge; it resets unconditionally.
    #[must_use]
    pub fn can_transition_to(self, next: SubmissionStatus) -> bool {
        use SubmissionStatus::{Failed, Idle, Submitting, Succeeded, Validating};
        match (self, next) {
            (from, Validating) => from.can_start(),
            (Validating, Submitting | Failed) | (Submitting, Succeeded | Failed) => true,
            (_, Idle) => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Idle => "idle",
            SubmissionStatus::Validating => "validating",
            SubmissionStatus::Submitting => "submitting",
            SubmissionStatus::Succeeded => "succeeded",
            SubmissionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome reported by the backend for a delivered payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    Success,
    Failure(String),
}

impl SubmissionResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionResult::Success)
    }
}

/// Stable classification of submission errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// One or more fields are invalid; surfaced inline per field.
    ValidationFailed,
    /// A submission is already running for this form.
    AlreadyInFlight,
    /// Network, timeout or unreadable reply.
    TransportFailure,
    /// The backend answered with an explicit failure.
    ApplicationRejected,
    /// The form was closed before the reply arrived.
    Abandoned,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::AlreadyInFlight => "already_in_flight",
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::ApplicationRejected => "application_rejected",
            ErrorKind::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SubmissionStatus::{Failed, Idle, Submitting, Succeeded, Validating};

    #[test]
    fn attempts_start_only_from_rest_states() {
        assert!(Idle.can_start());
        assert!(Succeeded.can_start());
        assert!(Failed.can_start());
        assert!(!Validating.can_start());
        assert!(!Submitting.can_start());
    }

    #[test]
    fn lifecycle_edges() {
        assert!(Idle.can_transition_to(Validating));
        assert!(Validating.can_transition_to(Failed));
        assert!(Validating.can_transition_to(Submitting));
        assert!(Submitting.can_transition_to(Succeeded));
        assert!(Submitting.can_transition_to(Failed));

        assert!(!Idle.can_transition_to(Submitting));
        assert!(!Validating.can_transition_to(Succeeded));
        assert!(!Submitting.can_transition_to(Validating));
        assert!(!Succeeded.can_transition_to(Failed));
    }
}
