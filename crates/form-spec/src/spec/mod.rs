pub mod field;
pub mod schema;

pub use field::{FieldDescriptor, FieldKind, SelectOption, ValidationRef};
pub use schema::{FormSchema, FormSchemaBuilder, FormSchemaDocument, check_integrity};
