//! Submission orchestration for intake forms.
//!
//! [`SubmissionController`] owns one form's state and runs at most one
//! submission at a time against a [`Transport`]. Progress is reported as
//! [`FormEvent`]s on an unbounded channel; edits can be mirrored to a
//! [`DraftStore`] through a debounced [`Autosave`].

mod autosave;
mod controller;
mod draft;
mod error;
mod events;

pub use autosave::{Autosave, DEFAULT_DEBOUNCE};
pub use controller::{DEFAULT_SUBMIT_TIMEOUT, SubmissionController};
pub use draft::{DraftError, DraftStore, FileDraftStore, MemoryDraftStore};
pub use error::{GENERIC_FAILURE_MESSAGE, SubmitError};
pub use events::{FormEvent, event_channel};

pub use intake_core::{FormKind, FormModel, Validator};
pub use intake_transport::{Transport, TransportError};
