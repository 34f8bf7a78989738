use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PredicateError;
use crate::mode::Mode;

/// Inputs a predicate may look at: the operating mode and sibling values.
#[derive(Debug, Clone, Copy)]
pub struct PredicateContext<'a> {
    pub mode: Mode,
    pub values: &'a Map<String, Value>,
}

impl<'a> PredicateContext<'a> {
    pub fn new(mode: Mode, values: &'a Map<String, Value>) -> Self {
        Self { mode, values }
    }

    fn lookup(&self, field: &str) -> Result<&'a Value, PredicateError> {
        self.values
            .get(field)
            .ok_or_else(|| PredicateError::UnknownField(field.to_string()))
    }
}

/// Serializable predicate AST used for `visible_when`, `disabled_when` and `required_when`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    Literal { value: bool },
    ModeIs { modes: Vec<Mode> },
    Eq { field: String, value: Value },
    In { field: String, values: Vec<Value> },
    Empty { field: String },
    Truthy { field: String },
    And { predicates: Vec<Predicate> },
    Or { predicates: Vec<Predicate> },
    Not { predicate: Box<Predicate> },
}

impl Predicate {
    pub fn mode_is(mode: Mode) -> Self {
        Predicate::ModeIs { modes: vec![mode] }
    }

    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn truthy(field: impl Into<String>) -> Self {
        Predicate::Truthy {
            field: field.into(),
        }
    }

    pub fn negate(self) -> Self {
        Predicate::Not {
            predicate: Box::new(self),
        }
    }

    /// Evaluates the predicate; unknown fields and ill-typed operands are errors.
    pub fn evaluate(&self, ctx: &PredicateContext<'_>) -> Result<bool, PredicateError> {
        match self {
            Predicate::Literal { value } => Ok(*value),
            Predicate::ModeIs { modes } => Ok(modes.contains(&ctx.mode)),
            Predicate::Eq { field, value } => Ok(ctx.lookup(field)? == value),
            Predicate::In { field, values } => {
                let current = ctx.lookup(field)?;
                if current.is_array() || current.is_object() {
                    return Err(PredicateError::TypeMismatch {
                        field: field.clone(),
                        expected: "a scalar",
                        found: type_name(current),
                    });
                }
                Ok(values.contains(current))
            }
            Predicate::Empty { field } => Ok(crate::validate::is_empty_value(ctx.lookup(field)?)),
            Predicate::Truthy { field } => truthy(field, ctx.lookup(field)?),
            Predicate::And { predicates } => {
                for predicate in predicates {
                    if !predicate.evaluate(ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or { predicates } => {
                for predicate in predicates {
                    if predicate.evaluate(ctx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not { predicate } => predicate.evaluate(ctx).map(|value| !value),
        }
    }

    /// Every field key the predicate reads, in traversal order.
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Literal { .. } | Predicate::ModeIs { .. } => {}
            Predicate::Eq { field, .. }
            | Predicate::In { field, .. }
            | Predicate::Empty { field }
            | Predicate::Truthy { field } => out.push(field),
            Predicate::And { predicates } | Predicate::Or { predicates } => {
                for predicate in predicates {
                    predicate.collect_fields(out);
                }
            }
            Predicate::Not { predicate } => predicate.collect_fields(out),
        }
    }
}

fn truthy(field: &str, value: &Value) -> Result<bool, PredicateError> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) => Ok(!text.is_empty()),
        Value::Number(number) => Ok(number.as_f64().is_some_and(|n| n != 0.0)),
        Value::Array(items) => Ok(!items.is_empty()),
        Value::Object(_) => Err(PredicateError::TypeMismatch {
            field: field.to_string(),
            expected: "a scalar or list",
            found: "an object",
        }),
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
