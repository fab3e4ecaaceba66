//! Form field model and validation verdicts.

use serde::{Deserialize, Serialize};

use crate::ids::FieldId;

/// Raw value submitted for an ungrouped checkbox when it is checked.
pub const CHECKBOX_ON: &str = "on";

/// Declared input type of a field; selects which validation rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Textarea,
    NumericBudget,
    Checkbox,
}

impl FieldKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Phone => "phone",
            FieldKind::Textarea => "textarea",
            FieldKind::NumericBudget => "numeric_budget",
            FieldKind::Checkbox => "checkbox",
        }
    }
}

/// Membership of a checkbox in a multi-select group.
///
/// All checked options of a group are submitted together under `group`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub group: String,
    pub value: String,
}

/// One labeled input of a form.
///
/// Invariant: `error` is `Some` iff the field last failed validation. Only
/// [`Field::apply`] and [`Field::set_value`] touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    id: FieldId,
    kind: FieldKind,
    required: bool,
    raw_value: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    choice: Option<Choice>,
}

impl Field {
    /// An empty field as created at form-open time.
    #[must_use]
    pub fn new(id: impl Into<FieldId>, kind: FieldKind, required: bool) -> Self {
        Self {
            id: id.into(),
            kind,
            required,
            raw_value: String::new(),
            error: None,
            choice: None,
        }
    }

    /// A checkbox belonging to a multi-select group.
    ///
    /// The id is derived as `group:value` so options never collide with
    /// ordinary fields.
    #[must_use]
    pub fn group_option(group: impl Into<String>, value: impl Into<String>) -> Self {
        let group = group.into();
        let value = value.into();
        Self {
            id: FieldId::new(format!("{group}:{value}")),
            kind: FieldKind::Checkbox,
            required: false,
            raw_value: String::new(),
            error: None,
            choice: Some(Choice { group, value }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &FieldId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn choice(&self) -> Option<&Choice> {
        self.choice.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw_value.trim().is_empty()
    }

    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.kind == FieldKind::Checkbox && !self.raw_value.is_empty()
    }

    /// Replace the value. An edit invalidates the previous verdict.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.raw_value = value.into();
        self.error = None;
    }

    /// Check or uncheck a checkbox; the raw value becomes the option value
    /// (or [`CHECKBOX_ON`]) when checked and empty when not.
    pub fn set_checked(&mut self, checked: bool) {
        let value = if checked {
            self.choice
                .as_ref()
                .map_or_else(|| CHECKBOX_ON.to_string(), |c| c.value.clone())
        } else {
            String::new()
        };
        self.set_value(value);
    }

    pub fn apply(&mut self, verdict: &Verdict) {
        self.error = match verdict {
            Verdict::Ok => None,
            Verdict::Error(message) => Some(message.clone()),
        };
    }

    /// Back to the form-open state.
    pub fn reset(&mut self) {
        self.raw_value.clear();
        self.error = None;
    }
}

/// Pass/fail outcome of validating a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    Error(String),
}

impl Verdict {
    pub fn error(message: impl Into<String>) -> Self {
        Verdict::Error(message.into())
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Verdict::Ok)
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Verdict::Ok => None,
            Verdict::Error(message) => Some(message),
        }
    }
}

/// A failed verdict attributed to its field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: FieldId,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_clears_previous_error() {
        let mut field = Field::new("email", FieldKind::Email, true);
        field.apply(&Verdict::error("Please enter a valid email address"));
        assert_eq!(field.error(), Some("Please enter a valid email address"));

        field.set_value("jane@example.com");
        assert_eq!(field.error(), None);
    }

    #[test]
    fn group_option_checks_to_its_value() {
        let mut field = Field::group_option("technologies", "react");
        assert_eq!(field.id().as_str(), "technologies:react");
        assert!(!field.is_checked());

        field.set_checked(true);
        assert_eq!(field.raw_value(), "react");
        assert!(field.is_checked());

        field.set_checked(false);
        assert_eq!(field.raw_value(), "");
    }

    #[test]
    fn ungrouped_checkbox_uses_on() {
        let mut field = Field::new("terms", FieldKind::Checkbox, true);
        field.set_checked(true);
        assert_eq!(field.raw_value(), CHECKBOX_ON);
    }

    #[test]
    fn whitespace_only_is_empty() {
        let mut field = Field::new("subject", FieldKind::Text, true);
        field.set_value("   ");
        assert!(field.is_empty());
    }
}
