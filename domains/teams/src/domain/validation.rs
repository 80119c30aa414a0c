//! Validation helpers for API request types

use std::borrow::Cow;

use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use super::entities::Team;

/// `validator` adapter for [`Team::validate_name`]
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    match Team::validate_name(name) {
        Ok(()) => Ok(()),
        Err(messages) => {
            let mut error = ValidationError::new("team_name");
            error.message = Some(Cow::Owned(messages.join("; ")));
            Err(error)
        }
    }
}

/// Flatten `validator` errors into the human-readable details list.
///
/// Nested struct errors are walked so that `{"team": {"name": ""}}` reports the
/// inner field's message.
pub fn error_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages = Vec::new();
    collect_messages(errors, &mut messages);
    messages.sort();
    messages
}

fn collect_messages(errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    for part in message.split("; ") {
                        out.push(part.to_string());
                    }
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(nested, out),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_messages(nested, out);
                }
            }
        }
    }
}
