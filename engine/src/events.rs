use intake_types::{ErrorKind, FieldError};
use tokio::sync::mpsc;

/// Notifications a controller publishes for whatever renders the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// A request is on the wire; disable the submit control.
    InProgress,
    /// Sent exactly once for every `InProgress`.
    InProgressCleared,
    /// Inline errors, first field to last.
    FieldErrors(Vec<FieldError>),
    Succeeded {
        message: String,
    },
    Failed {
        kind: ErrorKind,
        message: String,
    },
    DraftSaved,
    DraftRestored {
        fields: usize,
    },
}

#[must_use]
pub fn event_channel() -> (
    mpsc::UnboundedSender<FormEvent>,
    mpsc::UnboundedReceiver<FormEvent>,
) {
    mpsc::unbounded_channel()
}
