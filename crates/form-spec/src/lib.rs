#![allow(missing_docs)]

pub mod catalog;
pub mod error;
pub mod expr;
pub mod gate;
pub mod mode;
pub mod payload_schema;
pub mod render;
pub mod session;
pub mod spec;
pub mod state;
pub mod submit;
pub mod template;
pub mod validate;

pub use catalog::CatalogError;
pub use error::{
    FieldError, PredicateError, RenderError, SchemaIntegrityError, SubmissionError, SubmitError,
    ValidationError,
};
pub use expr::{Predicate, PredicateContext};
pub use gate::{EffectiveField, compute_effective_fields};
pub use mode::{Mode, ParseModeError};
pub use render::{Control, RenderNode, RenderedForm, render, render_json_ui, render_text};
pub use session::{AuthContext, AuthData};
pub use spec::{
    FieldDescriptor, FieldKind, FormSchema, FormSchemaBuilder, FormSchemaDocument, SelectOption,
    ValidationRef,
};
pub use state::FormState;
pub use submit::{
    FormInstance, FormStatus, SubmissionPayload, Transport, build_submission,
};
pub use validate::{Rule, RuleSet, RuleSetValidator, ValidationResult, Validator, validate};
