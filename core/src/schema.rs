//! The site's two forms: contact and project quote.
//!
//! A form definition fixes the field layout, the backend endpoint, the wire
//! shape of the payload, user-facing outcome messages and the draft key.

use std::fmt;
use std::str::FromStr;

use intake_types::{Field, FieldKind, Payload, PayloadValue};
use serde::{Deserialize, Serialize};

use crate::form::FormModel;

pub const CONTACT_ENDPOINT: &str = "/submit_contact";
pub const QUOTE_ENDPOINT: &str = "/submit_quote";

/// Local-storage key the quote form's draft lives under.
pub const QUOTE_DRAFT_KEY: &str = "webduos_project_form";

pub const QUOTE_TECHNOLOGIES: &[&str] = &[
    "html-css",
    "javascript",
    "react",
    "nodejs",
    "python",
    "wordpress",
];

pub const QUOTE_FEATURES: &[&str] = &[
    "responsive-design",
    "seo",
    "cms",
    "ecommerce",
    "contact-form",
    "analytics",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Contact,
    Quote,
}

impl FormKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FormKind::Contact => "contact",
            FormKind::Quote => "quote",
        }
    }

    /// Fields in display order, all empty.
    #[must_use]
    pub fn fields(self) -> Vec<Field> {
        match self {
            FormKind::Contact => vec![
                Field::new("firstName", FieldKind::Text, true),
                Field::new("lastName", FieldKind::Text, true),
                Field::new("email", FieldKind::Email, true),
                Field::new("subject", FieldKind::Text, true),
                Field::new("message", FieldKind::Textarea, true),
            ],
            FormKind::Quote => {
                let mut fields = vec![
                    Field::new("firstName", FieldKind::Text, true),
                    Field::new("lastName", FieldKind::Text, true),
                    Field::new("email", FieldKind::Email, true),
                    Field::new("phone", FieldKind::Phone, true),
                    Field::new("projectType", FieldKind::Text, true),
                    Field::new("projectDescription", FieldKind::Textarea, true),
                    Field::new("budget", FieldKind::NumericBudget, true),
                ];
                fields.extend(
                    QUOTE_TECHNOLOGIES
                        .iter()
                        .map(|v| Field::group_option("technologies", *v)),
                );
                fields.extend(
                    QUOTE_FEATURES
                        .iter()
                        .map(|v| Field::group_option("features", *v)),
                );
                fields
            }
        }
    }

    /// # Panics
    ///
    /// Never for the built-in forms; their field ids are fixed and unique.
    #[must_use]
    pub fn model(self) -> FormModel {
        FormModel::new(self.fields()).expect("form schema field ids are unique")
    }

    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            FormKind::Contact => CONTACT_ENDPOINT,
            FormKind::Quote => QUOTE_ENDPOINT,
        }
    }

    /// Reshape the form payload into what the endpoint expects.
    #[must_use]
    pub fn wire_payload(self, form: &Payload) -> Payload {
        match self {
            FormKind::Contact => {
                let text = |key: &str| form.text(key).unwrap_or_default().to_string();
                let mut wire = Payload::new();
                wire.insert(
                    "name",
                    format!("{} {}", text("firstName"), text("lastName")),
                );
                wire.insert("email", text("email"));
                wire.insert("subject", text("subject"));
                wire.insert("message", text("message"));
                wire
            }
            FormKind::Quote => {
                let mut wire = form.clone();
                for group in ["technologies", "features"] {
                    if !wire.contains_key(group) {
                        wire.insert(group, PayloadValue::List(Vec::new()));
                    }
                }
                wire
            }
        }
    }

    #[must_use]
    pub fn success_message(self) -> &'static str {
        match self {
            FormKind::Contact => {
                "Thank you! Your message has been sent successfully. We'll get back to you soon."
            }
            FormKind::Quote => {
                "Thank you! Your project request has been submitted successfully. We'll get back to you within 24 hours."
            }
        }
    }

    /// Shown when the backend rejects a submission without saying why.
    #[must_use]
    pub fn rejection_fallback(self) -> &'static str {
        match self {
            FormKind::Contact => "Failed to send message. Please try again later.",
            FormKind::Quote => "Failed to submit request. Please try again later.",
        }
    }

    #[must_use]
    pub fn draft_key(self) -> Option<&'static str> {
        match self {
            FormKind::Contact => None,
            FormKind::Quote => Some(QUOTE_DRAFT_KEY),
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contact" => Ok(FormKind::Contact),
            "quote" | "project" => Ok(FormKind::Quote),
            other => Err(format!("unknown form `{other}` (expected contact or quote)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::PayloadOptions;
    use crate::validate::Validator;

    fn fill(model: &mut FormModel, values: &[(&str, &str)]) {
        for (id, value) in values {
            model.set_value(id, *value).unwrap();
        }
    }

    #[test]
    fn schemas_have_unique_field_ids() {
        for kind in [FormKind::Contact, FormKind::Quote] {
            let fields = kind.fields();
            let ids: std::collections::HashSet<&str> =
                fields.iter().map(|f| f.id().as_str()).collect();
            assert_eq!(ids.len(), fields.len(), "duplicate id in the {kind} form");
            assert!(FormModel::new(fields.clone()).is_ok());
        }
    }

    #[test]
    fn quote_payload_has_exactly_the_expected_keys() {
        let mut model = FormKind::Quote.model();
        fill(
            &mut model,
            &[
                ("firstName", "Jane"),
                ("lastName", "Doe"),
                ("email", "jane@x.com"),
                ("phone", "03001234567"),
                ("projectType", "web"),
                ("projectDescription", "Build a site for my business"),
                ("budget", "5000"),
            ],
        );

        assert!(model.validate_all(&Validator::default()).is_empty());
        assert!(model.is_form_valid());

        let payload = model.to_payload(PayloadOptions::default());
        assert_eq!(
            payload.keys().collect::<Vec<_>>(),
            vec![
                "firstName",
                "lastName",
                "email",
                "phone",
                "projectType",
                "projectDescription",
                "budget",
                "technologies",
                "features",
            ]
        );
        assert_eq!(payload.get("technologies"), Some(&PayloadValue::List(vec![])));
        assert_eq!(payload.get("features"), Some(&PayloadValue::List(vec![])));
        assert_eq!(payload.text("budget"), Some("5000"));
        assert_eq!(FormKind::Quote.wire_payload(&payload), payload);
    }

    #[test]
    fn quote_groups_collect_checked_options_in_order() {
        let mut model = FormKind::Quote.model();
        model.set_checked("technologies:python", true).unwrap();
        model.set_checked("technologies:react", true).unwrap();
        let payload = model.to_payload(PayloadOptions::default());
        assert_eq!(
            payload.get("technologies"),
            Some(&PayloadValue::List(vec!["react".into(), "python".into()]))
        );
    }

    #[test]
    fn contact_wire_payload_joins_names() {
        let mut model = FormKind::Contact.model();
        fill(
            &mut model,
            &[
                ("firstName", "Jane"),
                ("lastName", "Doe"),
                ("email", "jane@x.com"),
                ("subject", "Hello"),
                ("message", "I would like a website."),
            ],
        );
        let wire = FormKind::Contact.wire_payload(&model.to_payload(PayloadOptions::default()));
        assert_eq!(
            wire.to_json().unwrap(),
            r#"{"name":"Jane Doe","email":"jane@x.com","subject":"Hello","message":"I would like a website."}"#
        );
    }

    #[test]
    fn only_quote_form_has_a_draft() {
        assert_eq!(FormKind::Quote.draft_key(), Some("webduos_project_form"));
        assert_eq!(FormKind::Contact.draft_key(), None);
    }

    #[test]
    fn parses_form_names() {
        assert_eq!("Contact".parse::<FormKind>(), Ok(FormKind::Contact));
        assert_eq!("project".parse::<FormKind>(), Ok(FormKind::Quote));
        assert!("newsletter".parse::<FormKind>().is_err());
    }
}
