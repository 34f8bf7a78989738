//! Error types shared by the form pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural problems found while assembling a [`FormSchema`](crate::FormSchema).
///
/// These are programming errors in a schema definition and are reported
/// before any form instance is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaIntegrityError {
    #[error("schema '{schema}': duplicate field key '{key}'")]
    DuplicateKey { schema: String, key: String },
    #[error("schema '{schema}': field '{key}' has no default value")]
    MissingDefault { schema: String, key: String },
    #[error("schema '{schema}': default value '{key}' does not belong to any field")]
    OrphanDefault { schema: String, key: String },
    #[error("schema '{schema}': choice field '{key}' declares no options")]
    EmptyOptions { schema: String, key: String },
    #[error("schema '{schema}': field '{key}' references unknown rule '{rule}'")]
    UnknownRule {
        schema: String,
        key: String,
        rule: String,
    },
    #[error("schema '{schema}': predicate on '{key}' references unknown field '{field}'")]
    UnknownPredicateField {
        schema: String,
        key: String,
        field: String,
    },
    #[error("schema '{schema}': rule '{rule}' has an invalid pattern: {message}")]
    InvalidPattern {
        schema: String,
        rule: String,
        message: String,
    },
}

/// Failure while evaluating a `visible_when`/`disabled_when`/`required_when` predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    #[error("predicate references unknown field '{0}'")]
    UnknownField(String),
    #[error("field '{field}' holds {found}, expected {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A single failed field, as surfaced to the user next to the control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub key: String,
    pub message: String,
    pub code: String,
}

impl FieldError {
    pub fn new(key: impl Into<String>, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
            code: code.into(),
        }
    }
}

/// One or more fields failed client-side validation at submit time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed for {}", join_keys(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    /// Offending keys in the order they were reported, without duplicates.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for error in &self.fields {
            if !keys.contains(&error.key.as_str()) {
                keys.push(&error.key);
            }
        }
        keys
    }
}

fn join_keys(fields: &[FieldError]) -> String {
    ValidationError {
        fields: fields.to_vec(),
    }
    .keys()
    .join(", ")
}

/// The caller-supplied transport rejected a submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("submission rejected: {message}")]
pub struct SubmissionError {
    pub message: String,
    pub status: Option<u16>,
}

impl SubmissionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Errors raised when routing a user edit through a rendered form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("field '{0}' is not rendered")]
    NotRendered(String),
    #[error("field '{0}' is disabled")]
    Disabled(String),
    #[error("invalid field path '{0}'")]
    InvalidPath(String),
    #[error("field '{key}' already holds the maximum of {max} items")]
    TooManyItems { key: String, max: usize },
}

/// Errors surfaced by a form instance around editing and submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] SubmissionError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("form is read-only in view mode")]
    ReadOnly,
    #[error("cannot {action} while the form is {status}")]
    InvalidState {
        action: &'static str,
        status: &'static str,
    },
    #[error("form was already submitted successfully")]
    Finished,
}
