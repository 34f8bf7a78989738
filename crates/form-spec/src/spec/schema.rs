use std::collections::BTreeSet;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SchemaIntegrityError;
use crate::spec::field::FieldDescriptor;
use crate::validate::{Rule, RuleSet};

/// Serialized shape of a schema, before integrity checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSchemaDocument {
    pub id: String,
    pub title: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub default_values: Map<String, Value>,
    #[serde(default, skip_serializing_if = "RuleSet::is_empty")]
    pub rules: RuleSet,
}

fn default_version() -> String {
    "1.0.0".into()
}

/// Checked, immutable field collection for one entity type.
///
/// Every field key is unique and has exactly one default value; every
/// predicate and rule reference resolves. Deserializing runs the same
/// checks as [`FormSchema::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FormSchemaDocument", into = "FormSchemaDocument")]
pub struct FormSchema {
    doc: FormSchemaDocument,
}

impl FormSchema {
    pub fn new(doc: FormSchemaDocument) -> Result<Self, SchemaIntegrityError> {
        check_integrity(&doc)?;
        Ok(Self { doc })
    }

    pub fn builder(id: impl Into<String>, title: impl Into<String>) -> FormSchemaBuilder {
        FormSchemaBuilder::new(id, title)
    }

    pub fn id(&self) -> &str {
        &self.doc.id
    }

    pub fn title(&self) -> &str {
        &self.doc.title
    }

    pub fn version(&self) -> &str {
        &self.doc.version
    }

    pub fn description(&self) -> Option<&str> {
        self.doc.description.as_deref()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.doc.fields
    }

    pub fn default_values(&self) -> &Map<String, Value> {
        &self.doc.default_values
    }

    pub fn rules(&self) -> &RuleSet {
        &self.doc.rules
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.doc.fields.iter().find(|field| field.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.doc.fields.iter().map(|field| field.key.as_str())
    }

    pub fn document(&self) -> &FormSchemaDocument {
        &self.doc
    }

    /// JSON Schema of the payload this schema submits.
    pub fn json_schema(&self) -> Value {
        crate::payload_schema::generate(self)
    }

    /// JSON Schema of the schema document format itself.
    pub fn document_json_schema() -> Value {
        serde_json::to_value(schemars::schema_for!(FormSchemaDocument)).unwrap_or(Value::Null)
    }
}

impl TryFrom<FormSchemaDocument> for FormSchema {
    type Error = SchemaIntegrityError;

    fn try_from(doc: FormSchemaDocument) -> Result<Self, Self::Error> {
        Self::new(doc)
    }
}

impl From<FormSchema> for FormSchemaDocument {
    fn from(schema: FormSchema) -> Self {
        schema.doc
    }
}

/// Incremental construction of a [`FormSchema`].
///
/// Fields added with [`field`](Self::field) get their kind's empty value as
/// default; [`default`](Self::default) overrides it.
#[derive(Debug, Clone)]
pub struct FormSchemaBuilder {
    doc: FormSchemaDocument,
}

impl FormSchemaBuilder {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            doc: FormSchemaDocument {
                id: id.into(),
                title: title.into(),
                version: default_version(),
                description: None,
                fields: Vec::new(),
                default_values: Map::new(),
                rules: RuleSet::new(),
            },
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.doc.version = version.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.doc.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.doc
            .default_values
            .entry(field.key.clone())
            .or_insert_with(|| field.kind.empty_value());
        self.doc.fields.push(field);
        self
    }

    pub fn default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.doc.default_values.insert(key.into(), value.into());
        self
    }

    pub fn rule(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.doc.rules.insert(name, rule);
        self
    }

    pub fn build(self) -> Result<FormSchema, SchemaIntegrityError> {
        FormSchema::new(self.doc)
    }
}

/// Runs every structural check; the first failure wins.
pub fn check_integrity(doc: &FormSchemaDocument) -> Result<(), SchemaIntegrityError> {
    let schema = doc.id.as_str();

    for (name, rule) in doc.rules.iter() {
        if let Some(pattern) = &rule.pattern
            && let Err(err) = Regex::new(pattern)
        {
            return Err(SchemaIntegrityError::InvalidPattern {
                schema: schema.to_string(),
                rule: name.clone(),
                message: err.to_string(),
            });
        }
    }

    let top_level: BTreeSet<&str> = doc.fields.iter().map(|field| field.key.as_str()).collect();
    check_fields(schema, None, &doc.fields, &top_level, &doc.rules)?;

    for field in &doc.fields {
        if !doc.default_values.contains_key(&field.key) {
            return Err(SchemaIntegrityError::MissingDefault {
                schema: schema.to_string(),
                key: field.key.clone(),
            });
        }
    }
    for key in doc.default_values.keys() {
        if !top_level.contains(key.as_str()) {
            return Err(SchemaIntegrityError::OrphanDefault {
                schema: schema.to_string(),
                key: key.clone(),
            });
        }
    }
    Ok(())
}

fn check_fields(
    schema: &str,
    parent: Option<&str>,
    fields: &[FieldDescriptor],
    top_level: &BTreeSet<&str>,
    rules: &RuleSet,
) -> Result<(), SchemaIntegrityError> {
    let mut seen = BTreeSet::new();
    for field in fields {
        let key = match parent {
            Some(parent) => format!("{}.{}", parent, field.key),
            None => field.key.clone(),
        };
        if !seen.insert(field.key.as_str()) {
            return Err(SchemaIntegrityError::DuplicateKey {
                schema: schema.to_string(),
                key,
            });
        }
        if field.kind.is_choice() && field.kind.options().is_none_or(<[_]>::is_empty) {
            return Err(SchemaIntegrityError::EmptyOptions {
                schema: schema.to_string(),
                key,
            });
        }
        if let Some(rule) = &field.validation
            && rules.get(rule.as_str()).is_none()
        {
            return Err(SchemaIntegrityError::UnknownRule {
                schema: schema.to_string(),
                key,
                rule: rule.0.clone(),
            });
        }
        for predicate in field.predicates() {
            if let Some(unknown) = predicate
                .referenced_fields()
                .into_iter()
                .find(|name| !top_level.contains(name))
            {
                return Err(SchemaIntegrityError::UnknownPredicateField {
                    schema: schema.to_string(),
                    key,
                    field: unknown.to_string(),
                });
            }
        }
        let children = field.children();
        if !children.is_empty() {
            check_fields(schema, Some(&key), children, top_level, rules)?;
        }
    }
    Ok(())
}
