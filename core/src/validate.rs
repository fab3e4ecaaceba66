//! Field validation rules.
//!
//! Rules run in a fixed precedence and the first failing rule wins:
//!
//! 1. required and empty
//! 2. email shape
//! 3. phone number (regional rule)
//! 4. budget amount
//! 5. textarea length
//! 6. person name
//!
//! Validation never mutates a field; callers apply the returned [`Verdict`].

use std::sync::{Arc, LazyLock};

use intake_types::{Field, FieldKind, Verdict};
use regex::Regex;

use crate::phone::{CallingCodeRule, PhoneRule};
use crate::text::char_len;

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const INVALID_PHONE_MESSAGE: &str = "Please enter a valid phone number";
pub const INVALID_BUDGET_MESSAGE: &str = "Please enter a valid budget amount (numbers only)";
pub const TEXT_TOO_SHORT_MESSAGE: &str =
    "Please provide more detailed information (minimum 10 characters)";
pub const TEXT_TOO_LONG_MESSAGE: &str = "Message is too long (maximum 2000 characters)";
pub const NAME_TOO_SHORT_MESSAGE: &str = "Name must be at least 2 characters long";
pub const NAME_CHARSET_MESSAGE: &str = "Name should only contain letters and spaces";

pub const TEXTAREA_MIN_CHARS: usize = 10;
pub const TEXTAREA_MAX_CHARS: usize = 2000;
pub const NAME_MIN_CHARS: usize = 2;

struct Patterns {
    email: Regex,
    budget: Regex,
    name: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    email: Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"),
    budget: Regex::new(r"^[0-9,]+$").expect("valid budget regex"),
    name: Regex::new(r"^[A-Za-z\s]+$").expect("valid name regex"),
});

#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    PATTERNS.email.is_match(value)
}

#[must_use]
pub fn is_valid_budget(value: &str) -> bool {
    PATTERNS.budget.is_match(value)
}

/// Pure field validator parameterised by a regional phone rule.
#[derive(Debug, Clone)]
pub struct Validator {
    phone: Arc<dyn PhoneRule>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Arc::new(CallingCodeRule::default()))
    }
}

impl Validator {
    #[must_use]
    pub fn new(phone: Arc<dyn PhoneRule>) -> Self {
        Self { phone }
    }

    #[must_use]
    pub fn phone_rule(&self) -> &dyn PhoneRule {
        self.phone.as_ref()
    }

    #[must_use]
    pub fn validate(&self, field: &Field) -> Verdict {
        let value = field.raw_value().trim();

        if value.is_empty() {
            return if field.is_required() {
                Verdict::error(REQUIRED_MESSAGE)
            } else {
                Verdict::Ok
            };
        }

        match field.kind() {
            FieldKind::Email if !is_valid_email(value) => {
                return Verdict::error(INVALID_EMAIL_MESSAGE);
            }
            FieldKind::Phone if !self.phone.is_valid(value) => {
                return Verdict::Error(self.phone_message());
            }
            FieldKind::NumericBudget if !is_valid_budget(value) => {
                return Verdict::error(INVALID_BUDGET_MESSAGE);
            }
            FieldKind::Textarea => {
                let len = char_len(value);
                if len < TEXTAREA_MIN_CHARS {
                    return Verdict::error(TEXT_TOO_SHORT_MESSAGE);
                }
                if len > TEXTAREA_MAX_CHARS {
                    return Verdict::error(TEXT_TOO_LONG_MESSAGE);
                }
            }
            _ => {}
        }

        if field.id().is_name_field() {
            if char_len(value) < NAME_MIN_CHARS {
                return Verdict::error(NAME_TOO_SHORT_MESSAGE);
            }
            if !PATTERNS.name.is_match(value) {
                return Verdict::error(NAME_CHARSET_MESSAGE);
            }
        }

        Verdict::Ok
    }

    fn phone_message(&self) -> String {
        match self.phone.example() {
            Some(example) => format!("{INVALID_PHONE_MESSAGE} (e.g., {example})"),
            None => INVALID_PHONE_MESSAGE.to_string(),
        }
    }
}
