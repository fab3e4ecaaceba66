//! In-memory form model: ordered fields, values and per-field error state.

use intake_types::{Field, FieldError, FieldId, FieldKind, Payload, PayloadValue, Verdict};
use thiserror::Error;

use crate::validate::Validator;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown field `{0}`")]
    UnknownField(FieldId),
    #[error("field `{field}` is a {kind}, not a checkbox")]
    NotACheckbox { field: FieldId, kind: &'static str },
    #[error("duplicate field `{0}`")]
    DuplicateField(FieldId),
}

/// How [`FormModel::to_payload`] treats optional fields left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyOptional {
    /// Submit them as `""`.
    #[default]
    Include,
    Omit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadOptions {
    pub empty_optional: EmptyOptional,
}

/// The fields of one form, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormModel {
    fields: Vec<Field>,
}

impl FormModel {
    pub fn new(fields: Vec<Field>) -> Result<Self, FormError> {
        let mut model = Self { fields: Vec::with_capacity(fields.len()) };
        for field in fields {
            model.push(field)?;
        }
        Ok(model)
    }

    pub fn push(&mut self, field: Field) -> Result<(), FormError> {
        if self.field(field.id().as_str()).is_some() {
            return Err(FormError::DuplicateField(field.id().clone()));
        }
        self.fields.push(field);
        Ok(())
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id().as_str() == id)
    }

    fn field_mut(&mut self, id: &str) -> Result<&mut Field, FormError> {
        self.fields
            .iter_mut()
            .find(|f| f.id().as_str() == id)
            .ok_or_else(|| FormError::UnknownField(FieldId::new(id)))
    }

    /// Record a user edit. Clears the field's previous error.
    pub fn set_value(&mut self, id: &str, value: impl Into<String>) -> Result<(), FormError> {
        self.field_mut(id)?.set_value(value);
        Ok(())
    }

    pub fn set_checked(&mut self, id: &str, checked: bool) -> Result<(), FormError> {
        let field = self.field_mut(id)?;
        if field.kind() != FieldKind::Checkbox {
            return Err(FormError::NotACheckbox {
                field: field.id().clone(),
                kind: field.kind().as_str(),
            });
        }
        field.set_checked(checked);
        Ok(())
    }

    pub fn apply_verdict(&mut self, id: &str, verdict: &Verdict) -> Result<(), FormError> {
        self.field_mut(id)?.apply(verdict);
        Ok(())
    }

    /// Validate one field (blur) and record the verdict on it.
    pub fn validate_field(&mut self, id: &str, validator: &Validator) -> Result<Verdict, FormError> {
        let field = self.field_mut(id)?;
        let verdict = validator.validate(field);
        field.apply(&verdict);
        Ok(verdict)
    }

    /// Validate every field, record all verdicts, and return the failures
    /// first-to-last.
    pub fn validate_all(&mut self, validator: &Validator) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for field in &mut self.fields {
            let verdict = validator.validate(field);
            field.apply(&verdict);
            if let Verdict::Error(message) = verdict {
                errors.push(FieldError {
                    field: field.id().clone(),
                    message,
                });
            }
        }
        errors
    }

    /// True iff no required field and no non-empty field carries an error.
    #[must_use]
    pub fn is_form_valid(&self) -> bool {
        self.fields
            .iter()
            .filter(|f| f.is_required() || !f.is_empty())
            .all(|f| f.error().is_none())
    }

    #[must_use]
    pub fn errors(&self) -> Vec<FieldError> {
        self.fields
            .iter()
            .filter_map(|f| {
                f.error().map(|message| FieldError {
                    field: f.id().clone(),
                    message: message.to_string(),
                })
            })
            .collect()
    }

    /// Project current values into a payload.
    ///
    /// Grouped checkboxes collapse into one list under the group name, placed
    /// where the group's first option appears; unchecked groups yield `[]`.
    #[must_use]
    pub fn to_payload(&self, options: PayloadOptions) -> Payload {
        let mut payload = Payload::new();
        for field in &self.fields {
            if let Some(choice) = field.choice() {
                if !payload.contains_key(&choice.group) {
                    payload.insert(choice.group.clone(), PayloadValue::List(Vec::new()));
                }
                if field.is_checked() {
                    payload.push_to_list(&choice.group, field.raw_value());
                }
                continue;
            }
            if field.is_empty()
                && !field.is_required()
                && options.empty_optional == EmptyOptional::Omit
            {
                continue;
            }
            payload.insert(field.id().as_str(), field.raw_value());
        }
        payload
    }

    /// Pre-fill from a saved draft. Unknown keys are ignored; list values
    /// re-check the matching group options.
    pub fn restore(&mut self, draft: &Payload) -> usize {
        let mut restored = 0;
        for field in &mut self.fields {
            if let Some(choice) = field.choice() {
                if let Some(PayloadValue::List(values)) = draft.get(&choice.group) {
                    let checked = values.iter().any(|v| *v == choice.value);
                    field.set_checked(checked);
                    restored += 1;
                }
                continue;
            }
            if let Some(PayloadValue::Text(value)) = draft.get(field.id().as_str()) {
                if field.kind() == FieldKind::Checkbox {
                    field.set_checked(!value.is_empty());
                } else {
                    field.set_value(value.clone());
                }
                restored += 1;
            }
        }
        tracing::debug!(restored, keys = draft.len(), "Restored form values");
        restored
    }

    /// Reset every field to its form-open state.
    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.reset();
        }
    }

    /// Share of required fields filled in (checked, for checkboxes), as a
    /// rounded percentage. A form without required fields is complete.
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        let required: Vec<&Field> = self.fields.iter().filter(|f| f.is_required()).collect();
        if required.is_empty() {
            return 100;
        }
        let filled = required
            .iter()
            .filter(|f| {
                if f.kind() == FieldKind::Checkbox {
                    f.is_checked()
                } else {
                    !f.is_empty()
                }
            })
            .count();
        ((filled as f64 / required.len() as f64) * 100.0).round() as u8
    }
}
