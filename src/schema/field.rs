use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

use super::form::{FormValue, UploadedFile};

/// Declared type of a form field. Raw strings are coerced into the matching JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Email,
    /// http or https only
    Url,
    Uuid,
    Integer,
    Number,
    /// Exact decimal, emitted as a string so `rust_decimal::Decimal` fields keep precision
    Decimal,
    /// Checkbox semantics: an absent field is `false` unless the field is marked required
    Boolean,
    /// `YYYY-MM-DD`
    Date,
    Choice(Vec<String>),
    File,
}

#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    label: Option<String>,
    kind: FieldKind,
    required: bool,
    min_len: Option<usize>,
    max_len: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
    max_bytes: Option<usize>,
    accept: Vec<String>,
    message: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind,
            required: true,
            min_len: None,
            max_len: None,
            min: None,
            max: None,
            max_bytes: None,
            accept: Vec::new(),
            message: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub fn url(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Url)
    }

    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Uuid)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Decimal)
    }

    /// Optional by default, since an unticked checkbox is not submitted at all
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean).optional()
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn choice<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, FieldKind::Choice(options.into_iter().map(Into::into).collect()))
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::File)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn min_len(mut self, n: usize) -> Self {
        self.min_len = Some(n);
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        self.max_len = Some(n);
        self
    }

    pub fn min(mut self, n: f64) -> Self {
        self.min = Some(n);
        self
    }

    pub fn max(mut self, n: f64) -> Self {
        self.max = Some(n);
        self
    }

    pub fn max_bytes(mut self, n: usize) -> Self {
        self.max_bytes = Some(n);
        self
    }

    /// Accepted content type; `image/*` style wildcards are allowed
    pub fn accept(mut self, content_type: impl Into<String>) -> Self {
        self.accept.push(content_type.into());
        self
    }

    /// Replaces every message this field would report with a single one
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn custom_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Coerce one raw value. `Err` carries one message per violated constraint.
    pub(crate) fn coerce(&self, raw: Option<&FormValue>) -> Result<Value, Vec<String>> {
        match raw {
            Some(FormValue::File(file)) if !file.is_empty() => {
                if self.kind == FieldKind::File {
                    self.coerce_file(file)
                } else {
                    Err(vec![format!("{} must be text", self.display_label())])
                }
            }
            Some(FormValue::Text(text)) if !text.trim().is_empty() => self.coerce_text(text),
            _ => self.missing(),
        }
    }

    fn missing(&self) -> Result<Value, Vec<String>> {
        if self.required {
            return Err(vec![format!("{} is required", self.display_label())]);
        }
        match self.kind {
            FieldKind::Boolean => Ok(Value::Bool(false)),
            _ => Ok(Value::Null),
        }
    }

    fn coerce_text(&self, raw: &str) -> Result<Value, Vec<String>> {
        let label = self.display_label();
        let trimmed = raw.trim();
        let mut problems = Vec::new();

        let value = match &self.kind {
            FieldKind::Text => {
                self.check_length(trimmed, &mut problems);
                Value::String(trimmed.to_string())
            }
            FieldKind::Email => {
                if !is_valid_email(trimmed) {
                    problems.push(format!("{} must be a valid email address", label));
                }
                self.check_length(trimmed, &mut problems);
                Value::String(trimmed.to_string())
            }
            FieldKind::Url => {
                match url::Url::parse(trimmed) {
                    Ok(u) if matches!(u.scheme(), "http" | "https") => {}
                    _ => problems.push(format!("{} must be a valid URL", label)),
                }
                self.check_length(trimmed, &mut problems);
                Value::String(trimmed.to_string())
            }
            FieldKind::Uuid => match Uuid::parse_str(trimmed) {
                Ok(id) => Value::String(id.to_string()),
                Err(_) => {
                    problems.push(format!("{} must be a valid UUID", label));
                    Value::Null
                }
            },
            FieldKind::Integer => match trimmed.parse::<i64>() {
                Ok(n) => {
                    self.check_range(n as f64, &mut problems);
                    Value::from(n)
                }
                Err(_) => {
                    problems.push(format!("{} must be a whole number", label));
                    Value::Null
                }
            },
            FieldKind::Number => match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => {
                    self.check_range(n, &mut problems);
                    serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
                }
                _ => {
                    problems.push(format!("{} must be a number", label));
                    Value::Null
                }
            },
            FieldKind::Decimal => match Decimal::from_str(trimmed) {
                Ok(d) => {
                    if let Some(f) = d.to_f64() {
                        self.check_range(f, &mut problems);
                    }
                    Value::String(d.to_string())
                }
                Err(_) => {
                    problems.push(format!("{} must be a decimal number", label));
                    Value::Null
                }
            },
            FieldKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "on" | "true" | "1" | "yes" => Value::Bool(true),
                "off" | "false" | "0" | "no" => Value::Bool(false),
                _ => {
                    problems.push(format!("{} must be true or false", label));
                    Value::Null
                }
            },
            FieldKind::Date => match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                Ok(date) => Value::String(date.format("%Y-%m-%d").to_string()),
                Err(_) => {
                    problems.push(format!("{} must be a valid date (YYYY-MM-DD)", label));
                    Value::Null
                }
            },
            FieldKind::Choice(options) => {
                if !options.iter().any(|o| o == trimmed) {
                    problems.push(format!("{} must be one of: {}", label, options.join(", ")));
                }
                Value::String(trimmed.to_string())
            }
            FieldKind::File => {
                problems.push(format!("{} must be a file", label));
                Value::Null
            }
        };

        if problems.is_empty() {
            Ok(value)
        } else {
            Err(problems)
        }
    }

    fn coerce_file(&self, file: &UploadedFile) -> Result<Value, Vec<String>> {
        let label = self.display_label();
        let mut problems = Vec::new();

        if let Some(max) = self.max_bytes {
            if file.size() > max {
                problems.push(format!("{} must be at most {} bytes", label, max));
            }
        }

        if !self.accept.is_empty() {
            let content_type = file.content_type.as_deref().unwrap_or("");
            if !self.accept.iter().any(|pattern| content_type_matches(pattern, content_type)) {
                problems.push(format!("{} must be a file of type: {}", label, self.accept.join(", ")));
            }
        }

        if !problems.is_empty() {
            return Err(problems);
        }

        serde_json::to_value(file.meta()).map_err(|e| vec![format!("{} could not be read: {}", label, e)])
    }

    fn check_length(&self, value: &str, problems: &mut Vec<String>) {
        let len = value.chars().count();
        if let Some(min) = self.min_len {
            if len < min {
                problems.push(format!("{} must be at least {} characters", self.display_label(), min));
            }
        }
        if let Some(max) = self.max_len {
            if len > max {
                problems.push(format!("{} must be at most {} characters", self.display_label(), max));
            }
        }
    }

    fn check_range(&self, value: f64, problems: &mut Vec<String>) {
        if let Some(min) = self.min {
            if value < min {
                problems.push(format!("{} must be at least {}", self.display_label(), min));
            }
        }
        if let Some(max) = self.max {
            if value > max {
                problems.push(format!("{} must be at most {}", self.display_label(), max));
            }
        }
    }
}

fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

fn content_type_matches(pattern: &str, content_type: &str) -> bool {
    let content_type = content_type.split(';').next().unwrap_or("").trim();
    match pattern.strip_suffix("/*") {
        Some(prefix) => content_type
            .split_once('/')
            .map(|(major, _)| major.eq_ignore_ascii_case(prefix))
            .unwrap_or(false),
        None => pattern.eq_ignore_ascii_case(content_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FormValue {
        FormValue::Text(s.to_string())
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ada@nyuchi.com"));
        assert!(!is_valid_email("ada@nyuchi"));
        assert!(!is_valid_email("@nyuchi.com"));
        assert!(!is_valid_email("ada @nyuchi.com"));
        assert!(!is_valid_email("ada@nyuchi..com"));
    }

    #[test]
    fn content_type_wildcards() {
        assert!(content_type_matches("image/*", "image/png"));
        assert!(content_type_matches("image/png", "image/png; charset=binary"));
        assert!(!content_type_matches("image/*", "application/pdf"));
    }

    #[test]
    fn absent_checkbox_is_false() {
        let field = Field::boolean("subscribe");
        assert!(!field.is_required());
        assert_eq!(field.coerce(None), Ok(Value::Bool(false)));
        assert_eq!(field.coerce(Some(&text("on"))), Ok(Value::Bool(true)));
    }

    #[test]
    fn required_checkbox_must_be_submitted() {
        let field = Field::boolean("accept_terms").label("Terms").required();
        assert_eq!(field.coerce(None), Err(vec!["Terms is required".to_string()]));
        assert_eq!(field.coerce(Some(&text(""))), Err(vec!["Terms is required".to_string()]));
        assert_eq!(field.coerce(Some(&text("on"))), Ok(Value::Bool(true)));
    }

    #[test]
    fn text_length_ignores_surrounding_whitespace() {
        let field = Field::text("name").label("Name").min_len(2).max_len(4);
        assert_eq!(
            field.coerce(Some(&text(" a "))),
            Err(vec!["Name must be at least 2 characters".to_string()])
        );
        assert_eq!(field.coerce(Some(&text("  abcd  "))), Ok(Value::from("abcd")));
    }

    #[test]
    fn whole_numbers_only_for_integer_fields() {
        let field = Field::integer("seats").label("Seats");
        assert_eq!(field.coerce(Some(&text(" 12 "))), Ok(Value::from(12)));
        assert_eq!(
            field.coerce(Some(&text("1.5"))),
            Err(vec!["Seats must be a whole number".to_string()])
        );
    }

    #[test]
    fn text_for_file_field_is_rejected() {
        let field = Field::file("logo").label("Logo");
        assert_eq!(field.coerce(Some(&text("logo.png"))), Err(vec!["Logo must be a file".to_string()]));
    }

    #[test]
    fn empty_upload_counts_as_missing() {
        let field = Field::file("logo").label("Logo").optional();
        let empty = FormValue::File(UploadedFile::new(Some(String::new()), None, Vec::new()));
        assert_eq!(field.coerce(Some(&empty)), Ok(Value::Null));
    }
}
