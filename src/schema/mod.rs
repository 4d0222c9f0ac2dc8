//! Declarative form schemas.
//!
//! A `FormSchema` turns an untyped `FormData` submission into a typed value or an
//! ordered list of field errors. Parsing is pure: no I/O and no hidden state, so
//! the same submission always yields the same result.

pub mod error;
pub mod field;
pub mod form;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub use error::{FieldError, ValidationErrors, ValidationResult};
pub use field::{Field, FieldKind};
pub use form::{FileMeta, FormData, FormValue, UploadedFile};

#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    fields: Vec<Field>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Coerce every declared field, collecting errors in declaration order.
    /// Undeclared keys in the submission are ignored.
    pub fn coerce(&self, form: &FormData) -> ValidationResult<Map<String, Value>> {
        let mut values = Map::new();
        let mut errors = Vec::new();

        for field in &self.fields {
            match field.coerce(form.get(field.name())) {
                Ok(value) => {
                    values.insert(field.name().to_string(), value);
                }
                Err(messages) => match field.custom_message() {
                    Some(message) => errors.push(FieldError::new(field.name(), message)),
                    None => errors.extend(messages.into_iter().map(|m| FieldError::new(field.name(), m))),
                },
            }
        }

        match ValidationErrors::from_errors(errors) {
            Some(errors) => Err(errors),
            None => Ok(values),
        }
    }

    /// Coerce then deserialize into `T`
    pub fn parse<T: DeserializeOwned>(&self, form: &FormData) -> ValidationResult<T> {
        let values = self.coerce(form)?;

        serde_json::from_value(Value::Object(values)).map_err(|e| {
            // The schema and the target type disagree; that is a programming error,
            // but it is still reported rather than raised.
            tracing::error!("Form schema does not match target type: {}", e);
            ValidationErrors::single("form", format!("Invalid form submission: {}", e))
        })
    }
}
