use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::spec::schema::FormSchema;

/// Live values of one form instance.
///
/// Starts from the schema defaults merged with caller overrides and is
/// only changed through [`FormState::set`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormState {
    values: Map<String, Value>,
    initial: Map<String, Value>,
    dirty: BTreeSet<String>,
}

impl FormState {
    pub fn from_schema(schema: &FormSchema, overrides: &Map<String, Value>) -> Self {
        let mut values = schema.default_values().clone();
        for (key, value) in overrides {
            values.insert(key.clone(), value.clone());
        }
        Self {
            initial: values.clone(),
            values,
            dirty: BTreeSet::new(),
        }
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Stores `value` under `key` and returns the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if self.initial.get(&key) == Some(&value) {
            self.dirty.remove(&key);
        } else {
            self.dirty.insert(key.clone());
        }
        self.values.insert(key, value)
    }

    /// True once any value differs from its initial state; drives
    /// unsaved-changes prompts.
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_keys(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }
}
