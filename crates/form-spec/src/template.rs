use std::sync::LazyLock;

use handlebars::Handlebars;
use serde_json::{Map, Value};
use tracing::debug;

static ENGINE: LazyLock<Handlebars<'static>> = LazyLock::new(|| {
    let mut registry = Handlebars::new();
    registry.register_escape_fn(handlebars::no_escape);
    registry.set_strict_mode(false);
    registry
});

/// Resolves `{{key}}` references in labels and placeholders against form values.
///
/// Text without placeholders is returned as is; a malformed template falls
/// back to the raw text.
pub fn interpolate(text: &str, values: &Map<String, Value>) -> String {
    if !text.contains("{{") {
        return text.to_string();
    }
    match ENGINE.render_template(text, values) {
        Ok(rendered) => rendered,
        Err(err) => {
            debug!(template = text, error = %err, "label template failed to render");
            text.to_string()
        }
    }
}
