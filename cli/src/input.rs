//! Turning command-line field values into a form payload.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use intake_core::{FormKind, FormModel};
use intake_types::Payload;

#[derive(Debug, Args)]
pub struct FormInput {
    /// Form to fill: contact or quote
    pub form: FormKind,
    /// Set a field, e.g. --set email=jane@x.com
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    pub values: Vec<(String, String)>,
    /// Check a checkbox option, e.g. --check technologies:react
    #[arg(long = "check", value_name = "OPTION")]
    pub checked: Vec<String>,
    /// Read field values from a JSON object (same shape as a saved draft)
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got `{raw}`")),
    }
}

impl FormInput {
    /// Collect `--file`, then `--set`, then `--check` into one payload,
    /// rejecting field names the form does not have.
    pub fn to_payload(&self, model: &FormModel) -> Result<Payload> {
        let mut payload = match &self.file {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Payload::from_json(&raw)
                    .with_context(|| format!("{} is not a JSON object of strings", path.display()))?
            }
            None => Payload::new(),
        };

        for (id, value) in &self.values {
            if model.field(id).is_none() {
                bail!("unknown field `{id}` for the {} form", self.form);
            }
            payload.insert(id.as_str(), value.as_str());
        }

        for option in &self.checked {
            let Some(field) = model.field(option) else {
                bail!("unknown checkbox `{option}` for the {} form", self.form);
            };
            match field.choice() {
                Some(choice) => payload.push_to_list(&choice.group, choice.value.as_str()),
                None => payload.insert(option.as_str(), intake_types::CHECKBOX_ON),
            }
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use intake_types::PayloadValue;

    use super::*;

    fn input(form: FormKind) -> FormInput {
        FormInput {
            form,
            values: Vec::new(),
            checked: Vec::new(),
            file: None,
        }
    }

    #[test]
    fn parses_assignments() {
        assert_eq!(
            parse_assignment("email=jane@x.com"),
            Ok(("email".into(), "jane@x.com".into()))
        );
        assert_eq!(parse_assignment("budget="), Ok(("budget".into(), String::new())));
        assert_eq!(
            parse_assignment("message=a=b"),
            Ok(("message".into(), "a=b".into()))
        );
        assert!(parse_assignment("=x").is_err());
        assert!(parse_assignment("novalue").is_err());
    }

    #[test]
    fn groups_checked_options() {
        let mut quote = input(FormKind::Quote);
        quote.values.push(("firstName".into(), "Jane".into()));
        quote.checked.push("technologies:react".into());
        quote.checked.push("technologies:python".into());

        let payload = quote.to_payload(&FormKind::Quote.model()).unwrap();
        assert_eq!(payload.text("firstName"), Some("Jane"));
        assert_eq!(
            payload.get("technologies"),
            Some(&PayloadValue::List(vec!["react".into(), "python".into()]))
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        let mut contact = input(FormKind::Contact);
        contact.values.push(("phone".into(), "123".into()));
        let err = contact
            .to_payload(&FormKind::Contact.model())
            .unwrap_err();
        assert!(err.to_string().contains("unknown field `phone`"));
    }

    #[test]
    fn reads_values_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.json");
        fs::write(&path, r#"{"firstName":"Jane","features":["seo"]}"#).unwrap();

        let mut quote = input(FormKind::Quote);
        quote.file = Some(path);
        quote.values.push(("firstName".into(), "Janet".into()));

        let payload = quote.to_payload(&FormKind::Quote.model()).unwrap();
        assert_eq!(payload.text("firstName"), Some("Janet"));
        assert_eq!(
            payload.get("features"),
            Some(&PayloadValue::List(vec!["seo".into()]))
        );
    }
}
