use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{FieldError, SubmissionError, SubmitError, ValidationError};
use crate::gate::{EffectiveField, compute_effective_fields};
use crate::mode::Mode;
use crate::render::{RenderedForm, render};
use crate::spec::field::FieldKind;
use crate::spec::schema::FormSchema;
use crate::state::FormState;
use crate::validate::{RuleSetValidator, Validator, validate};

/// Validated, schema-filtered values handed to a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub form_id: String,
    pub mode: Mode,
    pub values: Map<String, Value>,
}

impl SubmissionPayload {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }
}

/// Packages `state` for submission.
///
/// Only keys declared by the schema are copied, in field order; values of
/// fields hidden in the current mode are dropped. Fails with every
/// offending field when a required field is empty or a value is invalid.
pub fn build_submission<V>(
    state: &FormState,
    schema: &FormSchema,
    mode: Mode,
    validator: &V,
) -> Result<SubmissionPayload, SubmitError>
where
    V: Validator + ?Sized,
{
    if mode.is_read_only() {
        return Err(SubmitError::ReadOnly);
    }
    let result = validate(schema, state.values(), mode, validator);
    if !result.valid {
        return Err(ValidationError {
            fields: result.errors,
        }
        .into());
    }

    let mut values = Map::new();
    for effective in compute_effective_fields(schema.fields(), mode, state.values()) {
        if effective.hidden {
            continue;
        }
        let key = effective.key();
        let value = state.get(key).cloned().unwrap_or(Value::Null);
        let value = match effective.descriptor.kind {
            FieldKind::NestedArray { .. } => filter_rows(&effective, value),
            _ => value,
        };
        values.insert(key.to_string(), value);
    }
    debug!(form = schema.id(), %mode, fields = values.len(), "submission payload built");
    Ok(SubmissionPayload {
        form_id: schema.id().to_string(),
        mode,
        values,
    })
}

/// Rebuilds each row from the visible sub-fields only, in declaration order.
fn filter_rows(parent: &EffectiveField<'_>, value: Value) -> Value {
    let Value::Array(rows) = value else {
        return value;
    };
    let rows = rows
        .into_iter()
        .map(|row| {
            let Value::Object(mut row) = row else {
                return row;
            };
            let mut kept = Map::new();
            for child in parent.children.iter().filter(|child| !child.hidden) {
                if let Some(value) = row.remove(child.key()) {
                    kept.insert(child.key().to_string(), value);
                }
            }
            Value::Object(kept)
        })
        .collect();
    Value::Array(rows)
}

/// Caller-supplied hand-off to the backend.
pub trait Transport {
    fn submit(&self, payload: &SubmissionPayload) -> Result<Value, SubmissionError>;
}

impl<F> Transport for F
where
    F: Fn(&SubmissionPayload) -> Result<Value, SubmissionError>,
{
    fn submit(&self, payload: &SubmissionPayload) -> Result<Value, SubmissionError> {
        self(payload)
    }
}

/// Lifecycle of one form instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStatus {
    Pristine,
    Editing,
    Submitting,
    Succeeded,
    Failed,
}

impl FormStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormStatus::Pristine => "pristine",
            FormStatus::Editing => "editing",
            FormStatus::Submitting => "submitting",
            FormStatus::Succeeded => "succeeded",
            FormStatus::Failed => "failed",
        }
    }
}

/// One live form: a shared schema, a mode and the state it owns.
pub struct FormInstance<'s> {
    schema: &'s FormSchema,
    mode: Mode,
    state: FormState,
    status: FormStatus,
    validator: Box<dyn Validator + 's>,
    field_errors: Vec<FieldError>,
    form_error: Option<SubmissionError>,
    response: Option<Value>,
}

impl<'s> FormInstance<'s> {
    pub fn new(schema: &'s FormSchema, mode: Mode) -> Self {
        Self::with_overrides(schema, mode, &Map::new())
    }

    pub fn with_overrides(schema: &'s FormSchema, mode: Mode, overrides: &Map<String, Value>) -> Self {
        Self {
            schema,
            mode,
            state: FormState::from_schema(schema, overrides),
            status: FormStatus::Pristine,
            validator: Box::new(RuleSetValidator),
            field_errors: Vec::new(),
            form_error: None,
            response: None,
        }
    }

    pub fn with_validator(mut self, validator: impl Validator + 's) -> Self {
        self.validator = Box::new(validator);
        self
    }

    pub fn schema(&self) -> &'s FormSchema {
        self.schema
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status(&self) -> FormStatus {
        self.status
    }

    pub fn submitting(&self) -> bool {
        self.status == FormStatus::Submitting
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Per-field messages from the last rejected submit.
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    /// Form-level message from the last rejected transport call.
    pub fn form_error(&self) -> Option<&SubmissionError> {
        self.form_error.as_ref()
    }

    pub fn response(&self) -> Option<&Value> {
        self.response.as_ref()
    }

    pub fn effective_fields(&self) -> Vec<EffectiveField<'s>> {
        compute_effective_fields(self.schema.fields(), self.mode, self.state.values())
    }

    pub fn render(&self) -> RenderedForm {
        render(&self.effective_fields(), self.state.values())
    }

    /// Applies a user edit through the renderer, so hidden and disabled
    /// fields cannot change.
    pub fn edit(&mut self, path: &str, value: Value) -> Result<(), SubmitError> {
        self.ensure_editable("edit")?;
        let mut changes = Vec::new();
        self.render()
            .edit(path, value, |key, value| changes.push((key.to_string(), value)))?;
        self.apply(changes);
        Ok(())
    }

    pub fn push_item(&mut self, key: &str) -> Result<(), SubmitError> {
        self.ensure_editable("edit")?;
        let mut changes = Vec::new();
        self.render()
            .push_item(key, |key, value| changes.push((key.to_string(), value)))?;
        self.apply(changes);
        Ok(())
    }

    pub fn remove_item(&mut self, key: &str, index: usize) -> Result<(), SubmitError> {
        self.ensure_editable("edit")?;
        let mut changes = Vec::new();
        self.render()
            .remove_item(key, index, |key, value| changes.push((key.to_string(), value)))?;
        self.apply(changes);
        Ok(())
    }

    fn ensure_editable(&self, action: &'static str) -> Result<(), SubmitError> {
        match self.status {
            FormStatus::Succeeded => Err(SubmitError::Finished),
            FormStatus::Submitting => Err(SubmitError::InvalidState {
                action,
                status: self.status.as_str(),
            }),
            _ if self.mode.is_read_only() => Err(SubmitError::ReadOnly),
            _ => Ok(()),
        }
    }

    fn apply(&mut self, changes: Vec<(String, Value)>) {
        for (key, value) in changes {
            self.field_errors
                .retain(|error| error.key != key && !error.key.starts_with(&format!("{}[", key)));
            self.state.set(key, value);
        }
        self.transition(FormStatus::Editing);
    }

    /// Validates and enters `Submitting`, returning the payload to send.
    ///
    /// On validation failure the instance stays editable and keeps the
    /// per-field errors.
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, SubmitError> {
        self.ensure_editable("submit")?;
        match build_submission(&self.state, self.schema, self.mode, self.validator.as_ref()) {
            Ok(payload) => {
                self.field_errors.clear();
                self.form_error = None;
                self.transition(FormStatus::Submitting);
                Ok(payload)
            }
            Err(SubmitError::Validation(err)) => {
                self.field_errors = err.fields.clone();
                self.transition(FormStatus::Editing);
                Err(SubmitError::Validation(err))
            }
            Err(err) => Err(err),
        }
    }

    /// Resolves an in-flight submission with the transport's outcome.
    pub fn complete(&mut self, outcome: Result<Value, SubmissionError>) -> Result<(), SubmitError> {
        if self.status != FormStatus::Submitting {
            return Err(SubmitError::InvalidState {
                action: "complete a submission",
                status: self.status.as_str(),
            });
        }
        match outcome {
            Ok(response) => {
                self.response = Some(response);
                self.transition(FormStatus::Succeeded);
                Ok(())
            }
            Err(err) => {
                self.form_error = Some(err.clone());
                self.transition(FormStatus::Failed);
                Err(SubmitError::Transport(err))
            }
        }
    }

    /// Runs a full submit against `transport`.
    pub fn submit<T>(&mut self, transport: &T) -> Result<&Value, SubmitError>
    where
        T: Transport + ?Sized,
    {
        let payload = self.begin_submit()?;
        let outcome = transport.submit(&payload);
        self.complete(outcome)?;
        Ok(self.response.as_ref().unwrap_or(&Value::Null))
    }

    fn transition(&mut self, next: FormStatus) {
        if self.status != next {
            debug!(
                form = self.schema.id(),
                from = self.status.as_str(),
                to = next.as_str(),
                "form status changed"
            );
            self.status = next;
        }
    }
}
