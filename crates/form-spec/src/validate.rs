use std::collections::BTreeMap;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FieldError;
use crate::expr::type_name;
use crate::gate::{EffectiveField, compute_effective_fields};
use crate::mode::Mode;
use crate::spec::field::{FieldDescriptor, FieldKind};
use crate::spec::schema::FormSchema;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// A named validation rule referenced by field descriptors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default)]
    pub email: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Replaces the built-in message when the rule fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Rule {
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    pub fn length(min: Option<usize>, max: Option<usize>) -> Self {
        Self {
            min_len: min,
            max_len: max,
            ..Self::default()
        }
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min,
            max,
            ..Self::default()
        }
    }

    pub fn email() -> Self {
        Self {
            email: true,
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Shared, named rules for one schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RuleSet(BTreeMap<String, Rule>);

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, rule: Rule) {
        self.0.insert(name.into(), rule);
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Rule)> {
        self.0.iter()
    }
}

/// Outcome of checking one value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn pass() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn fail(error: FieldError) -> Self {
        Self::from_errors(vec![error])
    }

    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.valid = self.errors.is_empty();
    }
}

/// Checks a non-empty value against its field kind and referenced rule.
///
/// Emptiness and requirement are decided by the caller, which knows the
/// current mode.
pub trait Validator {
    fn validate(&self, field: &FieldDescriptor, value: &Value, rule: Option<&Rule>)
    -> ValidationResult;
}

/// Default validator backed by the schema's [`RuleSet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSetValidator;

impl Validator for RuleSetValidator {
    fn validate(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        rule: Option<&Rule>,
    ) -> ValidationResult {
        validate_value(&field.key, field, value, rule)
    }
}

/// Null, blank strings and empty lists count as "no answer".
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Validates every visible field of `values` for the given mode.
pub fn validate<V>(
    schema: &FormSchema,
    values: &Map<String, Value>,
    mode: Mode,
    validator: &V,
) -> ValidationResult
where
    V: Validator + ?Sized,
{
    let mut result = ValidationResult::pass();
    for effective in compute_effective_fields(schema.fields(), mode, values) {
        if effective.hidden {
            continue;
        }
        let field = effective.descriptor;
        let value = values.get(&field.key).unwrap_or(&Value::Null);
        if is_empty_value(value) {
            if effective.required {
                result.merge(ValidationResult::fail(required_error(&field.key)));
            }
            continue;
        }
        let rule = field
            .validation
            .as_ref()
            .and_then(|name| schema.rules().get(name.as_str()));
        result.merge(validator.validate(field, value, rule));
        if matches!(field.kind, FieldKind::NestedArray { .. }) {
            result.merge(validate_rows(schema, &effective, value, validator));
        }
    }
    result
}

/// Row sub-fields follow the gated children of `parent`: hidden ones are
/// skipped and requirement comes from the gate.
fn validate_rows<V>(
    schema: &FormSchema,
    parent: &EffectiveField<'_>,
    value: &Value,
    validator: &V,
) -> ValidationResult
where
    V: Validator + ?Sized,
{
    let mut result = ValidationResult::pass();
    let Some(rows) = value.as_array() else {
        return result;
    };
    for (index, row) in rows.iter().enumerate() {
        for effective in parent.children.iter().filter(|child| !child.hidden) {
            let child = effective.descriptor;
            let path = format!("{}[{}].{}", parent.key(), index, child.key);
            let child_value = row.get(&child.key).unwrap_or(&Value::Null);
            if is_empty_value(child_value) {
                if effective.required {
                    result.merge(ValidationResult::fail(required_error(&path)));
                }
                continue;
            }
            let rule = child
                .validation
                .as_ref()
                .and_then(|name| schema.rules().get(name.as_str()));
            let mut child_result = validator.validate(child, child_value, rule);
            for error in &mut child_result.errors {
                error.key = path.clone();
            }
            result.merge(child_result);
        }
    }
    result
}

pub(crate) fn required_error(key: &str) -> FieldError {
    FieldError::new(key, "this field is required", "required")
}

fn validate_value(
    key: &str,
    field: &FieldDescriptor,
    value: &Value,
    rule: Option<&Rule>,
) -> ValidationResult {
    if let Some(error) = check_kind(key, &field.kind, value) {
        return ValidationResult::fail(error);
    }
    match rule.and_then(|rule| enforce_rule(key, rule, value)) {
        Some(error) => ValidationResult::fail(error),
        None => ValidationResult::pass(),
    }
}

fn check_kind(key: &str, kind: &FieldKind, value: &Value) -> Option<FieldError> {
    let mismatch = |expected: &str| {
        Some(FieldError::new(
            key,
            format!("expected {}, found {}", expected, type_name(value)),
            "type_mismatch",
        ))
    };
    match kind {
        FieldKind::Text | FieldKind::TextArea { .. } => {
            if !value.is_string() {
                return mismatch("a string");
            }
        }
        FieldKind::Number => {
            if !value.is_number() {
                return mismatch("a number");
            }
        }
        FieldKind::Boolean => {
            if !value.is_boolean() {
                return mismatch("a boolean");
            }
        }
        FieldKind::Date => match value.as_str() {
            None => return mismatch("a date string"),
            Some(text) if !is_iso_date(text) => {
                return Some(FieldError::new(
                    key,
                    "expected a date formatted as YYYY-MM-DD",
                    "invalid_date",
                ));
            }
            Some(_) => {}
        },
        FieldKind::Select { options } => {
            if !options.iter().any(|option| &option.value == value) {
                return Some(FieldError::new(key, "invalid option", "option_mismatch"));
            }
        }
        FieldKind::MultiSelect { options } => {
            let Some(items) = value.as_array() else {
                return mismatch("a list");
            };
            if items
                .iter()
                .any(|item| !options.iter().any(|option| &option.value == item))
            {
                return Some(FieldError::new(key, "invalid option", "option_mismatch"));
            }
        }
        FieldKind::File { multiple, .. } => {
            let is_file = |item: &Value| item.is_string() || item.get("name").is_some();
            let ok = if *multiple {
                value
                    .as_array()
                    .is_some_and(|items| items.iter().all(is_file))
            } else {
                is_file(value)
            };
            if !ok {
                return mismatch(if *multiple {
                    "a list of files"
                } else {
                    "a file reference"
                });
            }
        }
        FieldKind::NestedArray {
            min_items,
            max_items,
            ..
        } => {
            let Some(items) = value.as_array() else {
                return mismatch("a list of objects");
            };
            if items.iter().any(|item| !item.is_object()) {
                return mismatch("a list of objects");
            }
            if let Some(min) = min_items
                && items.len() < *min
            {
                return Some(FieldError::new(
                    key,
                    format!("at least {} item(s) required", min),
                    "min_items",
                ));
            }
            if let Some(max) = max_items
                && items.len() > *max
            {
                return Some(FieldError::new(
                    key,
                    format!("at most {} item(s) allowed", max),
                    "max_items",
                ));
            }
        }
    }
    None
}

fn enforce_rule(key: &str, rule: &Rule, value: &Value) -> Option<FieldError> {
    let fail = |message: &str, code: &str| {
        Some(FieldError::new(
            key,
            rule.message.clone().unwrap_or_else(|| message.to_string()),
            code,
        ))
    };

    if let Some(pattern) = &rule.pattern
        && let Some(text) = value.as_str()
        && let Ok(regex) = Regex::new(pattern)
        && !regex.is_match(text)
    {
        return fail("value does not match pattern", "pattern_mismatch");
    }

    if rule.email
        && let Some(text) = value.as_str()
        && let Ok(regex) = Regex::new(EMAIL_PATTERN)
        && !regex.is_match(text)
    {
        return fail("value is not a valid email address", "invalid_email");
    }

    if let Some(min_len) = rule.min_len
        && let Some(text) = value.as_str()
        && text.chars().count() < min_len
    {
        return fail("string shorter than min length", "min_length");
    }

    if let Some(max_len) = rule.max_len
        && let Some(text) = value.as_str()
        && text.chars().count() > max_len
    {
        return fail("string longer than max length", "max_length");
    }

    if let Some(min) = rule.min
        && let Some(number) = value.as_f64()
        && number < min
    {
        return fail("value below minimum", "min");
    }

    if let Some(max) = rule.max
        && let Some(number) = value.as_f64()
        && number > max
    {
        return fail("value above maximum", "max");
    }

    if let Some(allowed) = &rule.one_of
        && !allowed.contains(value)
    {
        return fail("value is not one of the allowed values", "one_of");
    }

    if let Some(min_items) = rule.min_items
        && let Some(items) = value.as_array()
        && items.len() < min_items
    {
        return fail("too few items", "min_items");
    }

    if let Some(max_items) = rule.max_items
        && let Some(items) = value.as_array()
        && items.len() > max_items
    {
        return fail("too many items", "max_items");
    }

    None
}

fn is_iso_date(text: &str) -> bool {
    let parts: Vec<&str> = text.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return false;
    };
    if year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return false;
    }
    if ![year, month, day]
        .iter()
        .all(|part| part.bytes().all(|b| b.is_ascii_digit()))
    {
        return false;
    }
    let (Ok(year), Ok(month), Ok(day)) =
        (year.parse::<u32>(), month.parse::<u32>(), day.parse::<u32>())
    else {
        return false;
    };
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let days_in_month = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return false,
    };
    (1..=days_in_month).contains(&day)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_values() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!("   ")));
        assert!(is_empty_value(&json!([])));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
    }

    #[test]
    fn iso_dates() {
        assert!(is_iso_date("2024-02-29"));
        assert!(!is_iso_date("2023-02-29"));
        assert!(!is_iso_date("2024-13-01"));
        assert!(!is_iso_date("24-01-01"));
        assert!(!is_iso_date("2024-01-1"));
        assert!(!is_iso_date("+202-+1-01"));
        assert!(!is_iso_date("2024-+1-01"));
    }

    #[test]
    fn rule_message_overrides_default() {
        let rule = Rule::pattern("^[A-Z0-9]+$").with_message("use upper-case letters and digits");
        let error = enforce_rule("code", &rule, &json!("abc")).expect("error");
        assert_eq!(error.code, "pattern_mismatch");
        assert_eq!(error.message, "use upper-case letters and digits");
    }

    #[test]
    fn select_value_must_be_an_option() {
        let field = FieldDescriptor::new(
            "status",
            "Status",
            FieldKind::select([("Draft", "draft"), ("Published", "published")]),
        );
        let validator = RuleSetValidator;
        assert!(validator.validate(&field, &json!("draft"), None).valid);
        let result = validator.validate(&field, &json!("deleted"), None);
        assert_eq!(result.errors[0].code, "option_mismatch");
    }
}
