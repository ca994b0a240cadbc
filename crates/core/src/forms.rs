//! Form submission results and shared field validators.

use std::collections::BTreeMap;

use serde::Serialize;
use validator::{ValidationError, ValidationErrors};

/// Field name → error messages, in a stable order.
pub type FormErrors = BTreeMap<String, Vec<String>>;

/// Message for a required field that was left empty.
pub const REQUIRED_MESSAGE: &str = "This field is required.";

/// Result of submitting a form: saved, or bounced back with field errors.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Submission<T> {
    Accepted(T),
    Rejected(FormErrors),
}

impl<T> Submission<T> {
    /// The saved value, if accepted.
    pub fn accepted(self) -> Option<T> {
        match self {
            Self::Accepted(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }
}

/// Append an error for `field`.
pub fn add_error(errors: &mut FormErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

/// Flatten `validator` output into per-field messages.
#[must_use]
pub fn collect_errors(errors: &ValidationErrors) -> FormErrors {
    let mut collected = FormErrors::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map_or_else(|| error.code.to_string(), ToString::to_string);
            add_error(&mut collected, &field, message);
        }
    }
    collected
}

/// Reject strings that are empty once whitespace is trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message(REQUIRED_MESSAGE.into()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(custom(function = "validate_not_blank"))]
        text: String,
    }

    #[test]
    fn test_blank_text_is_required() {
        let errors = Sample {
            text: "   ".to_string(),
        }
        .validate()
        .unwrap_err();

        let collected = collect_errors(&errors);
        assert_eq!(collected["text"], vec![REQUIRED_MESSAGE.to_string()]);
    }

    #[test]
    fn test_non_blank_text_passes() {
        assert!(
            Sample {
                text: "hello".to_string()
            }
            .validate()
            .is_ok()
        );
    }
}
