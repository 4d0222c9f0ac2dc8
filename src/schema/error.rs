use serde::Serialize;
use thiserror::Error;

/// One violated constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Non-empty, ordered list of field errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.joined())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

pub type ValidationResult<T> = Result<T, ValidationErrors>;

impl ValidationErrors {
    /// Returns `None` when there is nothing to report
    pub fn from_errors(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    /// Display form used in action results
    pub fn joined(&self) -> String {
        self.messages().join(", ")
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}
