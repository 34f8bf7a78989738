//! Mode gate: derives per-render field constraints from mode and values.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::PredicateError;
use crate::expr::{Predicate, PredicateContext};
use crate::mode::Mode;
use crate::spec::field::FieldDescriptor;

/// A field descriptor together with the constraints in force for one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveField<'a> {
    pub descriptor: &'a FieldDescriptor,
    pub disabled: bool,
    pub hidden: bool,
    pub required: bool,
    /// Set when a predicate failed and the fail-safe constraints were applied.
    pub predicate_error: Option<String>,
    /// Gated sub-fields of a nested array.
    pub children: Vec<EffectiveField<'a>>,
}

impl EffectiveField<'_> {
    pub fn key(&self) -> &str {
        &self.descriptor.key
    }
}

/// Computes the effective constraints of `fields` in display order.
///
/// View mode disables everything. A predicate failure never propagates:
/// the field is forced to `disabled: true, hidden: false` and the failure
/// is logged.
pub fn compute_effective_fields<'a>(
    fields: &'a [FieldDescriptor],
    mode: Mode,
    values: &Map<String, Value>,
) -> Vec<EffectiveField<'a>> {
    let ctx = PredicateContext::new(mode, values);
    fields
        .iter()
        .map(|field| gate_field(field, &ctx, false))
        .collect()
}

struct Constraints {
    disabled: bool,
    hidden: bool,
    required: bool,
}

fn gate_field<'a>(
    field: &'a FieldDescriptor,
    ctx: &PredicateContext<'_>,
    parent_disabled: bool,
) -> EffectiveField<'a> {
    let (constraints, predicate_error) = match evaluate_constraints(field, ctx) {
        Ok(constraints) => (constraints, None),
        Err(err) => {
            warn!(
                field = %field.key,
                mode = %ctx.mode,
                error = %err,
                "field predicate failed; rendering field disabled"
            );
            let fallback = Constraints {
                disabled: true,
                hidden: false,
                required: field.required && !ctx.mode.is_read_only(),
            };
            (fallback, Some(err.to_string()))
        }
    };
    let disabled = constraints.disabled || parent_disabled;
    let children = field
        .children()
        .iter()
        .map(|child| gate_field(child, ctx, disabled))
        .collect();
    EffectiveField {
        descriptor: field,
        disabled,
        hidden: constraints.hidden,
        required: constraints.required,
        predicate_error,
        children,
    }
}

fn evaluate_constraints(
    field: &FieldDescriptor,
    ctx: &PredicateContext<'_>,
) -> Result<Constraints, PredicateError> {
    let hidden = !eval_or(field.visible_when.as_ref(), ctx, true)?;
    if ctx.mode.is_read_only() {
        return Ok(Constraints {
            disabled: true,
            hidden,
            required: false,
        });
    }
    let disabled = eval_or(field.disabled_when.as_ref(), ctx, false)?;
    let required = field.required || eval_or(field.required_when.as_ref(), ctx, false)?;
    Ok(Constraints {
        disabled,
        hidden,
        required,
    })
}

fn eval_or(
    predicate: Option<&Predicate>,
    ctx: &PredicateContext<'_>,
    absent: bool,
) -> Result<bool, PredicateError> {
    predicate.map_or(Ok(absent), |predicate| predicate.evaluate(ctx))
}
