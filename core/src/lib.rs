//! Form intake domain logic.
//!
//! - [`validate`] - pure field validation rules
//! - [`phone`] - pluggable regional phone rules
//! - [`form`] - the in-memory form model and payload projection
//! - [`schema`] - the contact and quote form definitions
//! - [`text`] - character counting for length-limited inputs
//!
//! Nothing here performs IO; submission and persistence live in
//! `intake-engine`.

pub mod form;
pub mod phone;
pub mod schema;
pub mod text;
pub mod validate;

pub use form::{EmptyOptional, FormError, FormModel, PayloadOptions};
pub use phone::{CallingCodeRule, PhoneRule};
pub use schema::FormKind;
pub use text::{CharacterCount, CounterLevel};
pub use validate::Validator;
