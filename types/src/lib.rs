//! Core domain types for form intake.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

mod field;
mod ids;
mod payload;
mod submission;

pub use field::{CHECKBOX_ON, Choice, Field, FieldError, FieldKind, Verdict};
pub use ids::{FieldId, Generation};
pub use payload::{Payload, PayloadValue};
pub use submission::{ErrorKind, SubmissionResult, SubmissionStatus};
