use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::expr::Predicate;

/// One `(label, value)` entry of a choice field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Name of a rule in the schema's shared rule set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ValidationRef(pub String);

impl ValidationRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ValidationRef {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Closed set of input kinds; each maps to exactly one rendered control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea {
        #[serde(default)]
        auto_resize: bool,
    },
    Number,
    Boolean,
    Select {
        options: Vec<SelectOption>,
    },
    MultiSelect {
        options: Vec<SelectOption>,
    },
    Date,
    File {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        accept: Vec<String>,
        #[serde(default)]
        multiple: bool,
    },
    /// List of objects, each edited with its own sub-fields.
    NestedArray {
        fields: Vec<FieldDescriptor>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
}

impl FieldKind {
    pub fn select<I>(options: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, &'static str)>,
    {
        FieldKind::Select {
            options: options
                .into_iter()
                .map(|(label, value)| SelectOption::new(label, value))
                .collect(),
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, FieldKind::Select { .. } | FieldKind::MultiSelect { .. })
    }

    pub fn options(&self) -> Option<&[SelectOption]> {
        match self {
            FieldKind::Select { options } | FieldKind::MultiSelect { options } => Some(options),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::TextArea { .. } => "text_area",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Select { .. } => "select",
            FieldKind::MultiSelect { .. } => "multi_select",
            FieldKind::Date => "date",
            FieldKind::File { .. } => "file",
            FieldKind::NestedArray { .. } => "nested_array",
        }
    }

    /// Initial value used when a schema does not spell out a default.
    pub fn empty_value(&self) -> Value {
        match self {
            FieldKind::Text | FieldKind::TextArea { .. } => Value::String(String::new()),
            FieldKind::Boolean => Value::Bool(false),
            FieldKind::MultiSelect { .. } | FieldKind::NestedArray { .. } => {
                Value::Array(Vec::new())
            }
            FieldKind::File { multiple: true, .. } => Value::Array(Vec::new()),
            FieldKind::Number | FieldKind::Select { .. } | FieldKind::Date | FieldKind::File { .. } => {
                Value::Null
            }
        }
    }
}

/// Static declaration of one form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldDescriptor {
    pub key: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_when: Option<Predicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_when: Option<Predicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_when: Option<Predicate>,
}

impl FieldDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            kind,
            label: label.into(),
            placeholder: None,
            description: None,
            required: false,
            validation: None,
            visible_when: None,
            disabled_when: None,
            required_when: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validation(mut self, rule: impl Into<ValidationRef>) -> Self {
        self.validation = Some(rule.into());
        self
    }

    pub fn visible_when(mut self, predicate: Predicate) -> Self {
        self.visible_when = Some(predicate);
        self
    }

    pub fn disabled_when(mut self, predicate: Predicate) -> Self {
        self.disabled_when = Some(predicate);
        self
    }

    pub fn required_when(mut self, predicate: Predicate) -> Self {
        self.required_when = Some(predicate);
        self
    }

    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        [&self.visible_when, &self.disabled_when, &self.required_when]
            .into_iter()
            .flatten()
    }

    /// Sub-fields of a nested array, empty for every other kind.
    pub fn children(&self) -> &[FieldDescriptor] {
        match &self.kind {
            FieldKind::NestedArray { fields, .. } => fields,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn kind_is_flattened_into_descriptor() {
        let field: FieldDescriptor = serde_json::from_value(json!({
            "key": "status",
            "type": "select",
            "label": "Status",
            "options": [
                { "label": "Draft", "value": "draft" },
                { "label": "Published", "value": "published" }
            ],
            "required": true
        }))
        .expect("descriptor");
        assert!(field.kind.is_choice());
        assert_eq!(field.kind.options().map(<[_]>::len), Some(2));
        assert!(field.required);

        let encoded = serde_json::to_value(&field).expect("encode");
        assert_eq!(encoded["type"], "select");
        assert!(encoded.get("placeholder").is_none());
    }

    #[test]
    fn empty_values_follow_kind() {
        assert_eq!(FieldKind::Text.empty_value(), json!(""));
        assert_eq!(FieldKind::Boolean.empty_value(), json!(false));
        assert_eq!(
            FieldKind::File {
                accept: vec![],
                multiple: true
            }
            .empty_value(),
            json!([])
        );
        assert_eq!(FieldKind::Date.empty_value(), Value::Null);
    }
}
