use serde_json::{Map, Value, json};

use crate::error::RenderError;
use crate::gate::EffectiveField;
use crate::spec::field::{FieldKind, SelectOption};
use crate::template::interpolate;

/// Concrete control instantiated for a field kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    TextInput,
    TextArea {
        auto_resize: bool,
    },
    NumberInput,
    Toggle,
    Dropdown {
        options: Vec<SelectOption>,
    },
    MultiSelect {
        options: Vec<SelectOption>,
    },
    DatePicker,
    FileUpload {
        accept: Vec<String>,
        multiple: bool,
    },
    /// One row of sub-controls per item of the bound list.
    Nested {
        items: Vec<Vec<RenderNode>>,
        template: Vec<(String, Value)>,
        max_items: Option<usize>,
    },
}

impl Control {
    pub fn label(&self) -> &'static str {
        match self {
            Control::TextInput => "text_input",
            Control::TextArea { .. } => "text_area",
            Control::NumberInput => "number_input",
            Control::Toggle => "toggle",
            Control::Dropdown { .. } => "dropdown",
            Control::MultiSelect { .. } => "multi_select",
            Control::DatePicker => "date_picker",
            Control::FileUpload { .. } => "file_upload",
            Control::Nested { .. } => "nested",
        }
    }
}

/// A rendered, visible control bound to one value.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    /// Field key, or `parent[index].child` inside nested lists.
    pub key: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub disabled: bool,
    pub value: Value,
    pub control: Control,
}

/// UI tree produced for one render pass. Holds no form state of its own:
/// edits are routed back through a change callback.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedForm {
    pub nodes: Vec<RenderNode>,
}

/// Builds the control tree for `fields`, skipping hidden ones entirely.
pub fn render(fields: &[EffectiveField<'_>], values: &Map<String, Value>) -> RenderedForm {
    let nodes = fields
        .iter()
        .filter(|field| !field.hidden)
        .map(|field| {
            let value = values.get(field.key()).cloned().unwrap_or(Value::Null);
            render_node(field, field.key().to_string(), value, values)
        })
        .collect();
    RenderedForm { nodes }
}

fn render_node(
    field: &EffectiveField<'_>,
    key: String,
    value: Value,
    values: &Map<String, Value>,
) -> RenderNode {
    let descriptor = field.descriptor;
    let control = match &descriptor.kind {
        FieldKind::Text => Control::TextInput,
        FieldKind::TextArea { auto_resize } => Control::TextArea {
            auto_resize: *auto_resize,
        },
        FieldKind::Number => Control::NumberInput,
        FieldKind::Boolean => Control::Toggle,
        FieldKind::Select { options } => Control::Dropdown {
            options: options.clone(),
        },
        FieldKind::MultiSelect { options } => Control::MultiSelect {
            options: options.clone(),
        },
        FieldKind::Date => Control::DatePicker,
        FieldKind::File { accept, multiple } => Control::FileUpload {
            accept: accept.clone(),
            multiple: *multiple,
        },
        FieldKind::NestedArray { max_items, .. } => Control::Nested {
            items: render_rows(field, &key, &value, values),
            template: field
                .children
                .iter()
                .map(|child| (child.key().to_string(), child.descriptor.kind.empty_value()))
                .collect(),
            max_items: *max_items,
        },
    };
    RenderNode {
        key,
        label: interpolate(&descriptor.label, values),
        placeholder: descriptor
            .placeholder
            .as_deref()
            .map(|text| interpolate(text, values)),
        description: descriptor.description.clone(),
        required: field.required,
        disabled: field.disabled,
        value,
        control,
    }
}

fn render_rows(
    field: &EffectiveField<'_>,
    key: &str,
    value: &Value,
    values: &Map<String, Value>,
) -> Vec<Vec<RenderNode>> {
    let Some(rows) = value.as_array() else {
        return Vec::new();
    };
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            field
                .children
                .iter()
                .filter(|child| !child.hidden)
                .map(|child| {
                    let child_value = row.get(child.key()).cloned().unwrap_or(Value::Null);
                    let path = format!("{}[{}].{}", key, index, child.key());
                    render_node(child, path, child_value, values)
                })
                .collect()
        })
        .collect()
}

impl RenderedForm {
    pub fn node(&self, key: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|node| node.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.key.as_str())
    }

    /// Routes a user edit to `on_change`.
    ///
    /// Only rendered, enabled controls emit; an edit inside a nested list is
    /// emitted as the whole updated list under the parent key.
    pub fn edit<F>(&self, path: &str, value: Value, mut on_change: F) -> Result<(), RenderError>
    where
        F: FnMut(&str, Value),
    {
        match parse_path(path)? {
            FieldPath::Top(key) => {
                let node = self.enabled_node(key)?;
                on_change(&node.key, value);
            }
            FieldPath::Nested { parent, index, child } => {
                let node = self.enabled_node(parent)?;
                let Control::Nested { items, .. } = &node.control else {
                    return Err(RenderError::InvalidPath(path.to_string()));
                };
                let row = items
                    .get(index)
                    .ok_or_else(|| RenderError::InvalidPath(path.to_string()))?;
                let cell = row
                    .iter()
                    .find(|cell| cell.key == path)
                    .ok_or_else(|| RenderError::NotRendered(path.to_string()))?;
                if cell.disabled {
                    return Err(RenderError::Disabled(path.to_string()));
                }
                let mut list = node.value.as_array().cloned().unwrap_or_default();
                let Some(Value::Object(object)) = list.get_mut(index) else {
                    return Err(RenderError::InvalidPath(path.to_string()));
                };
                object.insert(child.to_string(), value);
                on_change(&node.key, Value::Array(list));
            }
        }
        Ok(())
    }

    /// Appends an empty item to a nested list.
    pub fn push_item<F>(&self, key: &str, mut on_change: F) -> Result<(), RenderError>
    where
        F: FnMut(&str, Value),
    {
        let node = self.enabled_node(key)?;
        let Control::Nested {
            template,
            max_items,
            ..
        } = &node.control
        else {
            return Err(RenderError::InvalidPath(key.to_string()));
        };
        let mut list = node.value.as_array().cloned().unwrap_or_default();
        if let Some(max) = max_items
            && list.len() >= *max
        {
            return Err(RenderError::TooManyItems {
                key: key.to_string(),
                max: *max,
            });
        }
        let item: Map<String, Value> = template.iter().cloned().collect();
        list.push(Value::Object(item));
        on_change(&node.key, Value::Array(list));
        Ok(())
    }

    /// Removes the item at `index` from a nested list.
    pub fn remove_item<F>(&self, key: &str, index: usize, mut on_change: F) -> Result<(), RenderError>
    where
        F: FnMut(&str, Value),
    {
        let node = self.enabled_node(key)?;
        if !matches!(node.control, Control::Nested { .. }) {
            return Err(RenderError::InvalidPath(key.to_string()));
        }
        let mut list = node.value.as_array().cloned().unwrap_or_default();
        if index >= list.len() {
            return Err(RenderError::InvalidPath(format!("{}[{}]", key, index)));
        }
        list.remove(index);
        on_change(&node.key, Value::Array(list));
        Ok(())
    }

    fn enabled_node(&self, key: &str) -> Result<&RenderNode, RenderError> {
        let node = self
            .node(key)
            .ok_or_else(|| RenderError::NotRendered(key.to_string()))?;
        if node.disabled {
            return Err(RenderError::Disabled(key.to_string()));
        }
        Ok(node)
    }
}

enum FieldPath<'a> {
    Top(&'a str),
    Nested {
        parent: &'a str,
        index: usize,
        child: &'a str,
    },
}

fn parse_path(path: &str) -> Result<FieldPath<'_>, RenderError> {
    let invalid = || RenderError::InvalidPath(path.to_string());
    let Some((parent, rest)) = path.split_once('[') else {
        if path.is_empty() || path.contains(['.', ']']) {
            return Err(invalid());
        }
        return Ok(FieldPath::Top(path));
    };
    let (index, child) = rest.split_once("].").ok_or_else(invalid)?;
    let index = index.parse::<usize>().map_err(|_| invalid())?;
    if parent.is_empty() || child.is_empty() {
        return Err(invalid());
    }
    Ok(FieldPath::Nested {
        parent,
        index,
        child,
    })
}

/// Render the form as a structured JSON-friendly value.
pub fn render_json_ui(form_id: &str, title: &str, rendered: &RenderedForm) -> Value {
    json!({
        "form_id": form_id,
        "form_title": title,
        "fields": rendered.nodes.iter().map(node_json).collect::<Vec<_>>(),
    })
}

fn node_json(node: &RenderNode) -> Value {
    let mut map = Map::new();
    map.insert("key".into(), Value::String(node.key.clone()));
    map.insert("control".into(), Value::String(node.control.label().into()));
    map.insert("label".into(), Value::String(node.label.clone()));
    if let Some(placeholder) = &node.placeholder {
        map.insert("placeholder".into(), Value::String(placeholder.clone()));
    }
    if let Some(description) = &node.description {
        map.insert("description".into(), Value::String(description.clone()));
    }
    map.insert("required".into(), Value::Bool(node.required));
    map.insert("disabled".into(), Value::Bool(node.disabled));
    map.insert("value".into(), node.value.clone());
    match &node.control {
        Control::Dropdown { options } | Control::MultiSelect { options } => {
            map.insert(
                "options".into(),
                Value::Array(
                    options
                        .iter()
                        .map(|option| json!({ "label": option.label, "value": option.value }))
                        .collect(),
                ),
            );
        }
        Control::FileUpload { accept, multiple } => {
            map.insert("accept".into(), json!(accept));
            map.insert("multiple".into(), Value::Bool(*multiple));
        }
        Control::TextArea { auto_resize } => {
            map.insert("auto_resize".into(), Value::Bool(*auto_resize));
        }
        Control::Nested {
            items, max_items, ..
        } => {
            map.insert(
                "items".into(),
                Value::Array(
                    items
                        .iter()
                        .map(|row| Value::Array(row.iter().map(node_json).collect()))
                        .collect(),
                ),
            );
            if let Some(max) = max_items {
                map.insert("max_items".into(), json!(max));
            }
        }
        Control::TextInput | Control::NumberInput | Control::Toggle | Control::DatePicker => {}
    }
    Value::Object(map)
}

/// Render the form as human-friendly text.
pub fn render_text(title: &str, rendered: &RenderedForm) -> String {
    let mut lines = vec![format!("Form: {}", title)];
    for node in &rendered.nodes {
        push_node_lines(&mut lines, node, 1);
    }
    lines.join("\n")
}

fn push_node_lines(lines: &mut Vec<String>, node: &RenderNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let mut entry = format!("{}- {} [{}] {}", indent, node.key, node.control.label(), node.label);
    if node.required {
        entry.push_str(" *");
    }
    if node.disabled {
        entry.push_str(" (disabled)");
    }
    match &node.control {
        Control::Nested { items, .. } => {
            entry.push_str(&format!(" ({} item(s))", items.len()));
            lines.push(entry);
            for row in items {
                for cell in row {
                    push_node_lines(lines, cell, depth + 1);
                }
            }
        }
        Control::Dropdown { options } | Control::MultiSelect { options } => {
            entry.push_str(&format!(" = {}", value_to_display(&node.value)));
            lines.push(entry);
            let choices = options
                .iter()
                .map(|option| option.label.as_str())
                .collect::<Vec<_>>();
            lines.push(format!("{}    choices: {}", indent, choices.join(", ")));
        }
        _ => {
            entry.push_str(&format!(" = {}", value_to_display(&node.value)));
            lines.push(entry);
        }
    }
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => num.to_string(),
        other => other.to_string(),
    }
}
