use serde_json::{Map, Value, json};

use crate::spec::field::{FieldDescriptor, FieldKind};
use crate::spec::schema::FormSchema;

/// JSON Schema (draft 2020-12) of the submission payload for `schema`.
///
/// Lists every field; `required` carries the statically required ones.
/// Mode-dependent requirements are not expressed.
pub fn generate(schema: &FormSchema) -> Value {
    let mut document = object_schema(schema.fields());
    if let Value::Object(map) = &mut document {
        map.insert(
            "$schema".into(),
            Value::String("https://json-schema.org/draft/2020-12/schema".into()),
        );
        map.insert("title".into(), Value::String(schema.title().to_string()));
        if let Some(description) = schema.description() {
            map.insert("description".into(), Value::String(description.to_string()));
        }
    }
    document
}

fn object_schema(fields: &[FieldDescriptor]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        let mut property = field_schema(&field.kind);
        if let Value::Object(map) = &mut property {
            map.insert("title".into(), Value::String(field.label.clone()));
            if let Some(description) = &field.description {
                map.insert("description".into(), Value::String(description.clone()));
            }
        }
        properties.insert(field.key.clone(), property);
        if field.required {
            required.push(Value::String(field.key.clone()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn field_schema(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::Text | FieldKind::TextArea { .. } => json!({ "type": "string" }),
        FieldKind::Number => json!({ "type": "number" }),
        FieldKind::Boolean => json!({ "type": "boolean" }),
        FieldKind::Date => json!({ "type": "string", "format": "date" }),
        FieldKind::Select { options } => json!({
            "enum": options.iter().map(|option| option.value.clone()).collect::<Vec<_>>(),
        }),
        FieldKind::MultiSelect { options } => json!({
            "type": "array",
            "uniqueItems": true,
            "items": {
                "enum": options.iter().map(|option| option.value.clone()).collect::<Vec<_>>(),
            },
        }),
        FieldKind::File { multiple, .. } => {
            if *multiple {
                json!({ "type": "array", "items": { "type": ["string", "object"] } })
            } else {
                json!({ "type": ["string", "object"] })
            }
        }
        FieldKind::NestedArray {
            fields,
            min_items,
            max_items,
        } => {
            let mut map = Map::new();
            map.insert("type".into(), Value::String("array".into()));
            map.insert("items".into(), object_schema(fields));
            if let Some(min) = min_items {
                map.insert("minItems".into(), json!(min));
            }
            if let Some(max) = max_items {
                map.insert("maxItems".into(), json!(max));
            }
            Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::field::SelectOption;

    #[test]
    fn select_becomes_enum() {
        let schema = FormSchema::builder("brand", "Brand")
            .field(FieldDescriptor::new("name", "Name", FieldKind::Text).required())
            .field(FieldDescriptor::new(
                "status",
                "Status",
                FieldKind::Select {
                    options: vec![SelectOption::new("Draft", "draft")],
                },
            ))
            .build()
            .expect("schema");
        let generated = generate(&schema);
        assert_eq!(generated["properties"]["status"]["enum"], json!(["draft"]));
        assert_eq!(generated["required"], json!(["name"]));
        assert_eq!(generated["additionalProperties"], json!(false));
    }
}
