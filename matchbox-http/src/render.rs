//! Template rendering with strict missing-key semantics.
//!
//! Templates use the Handlebars dialect with HTML escaping disabled. Strict
//! mode is always on: referencing a key absent from the merged metadata is a
//! render error, never a silent empty substitution. Besides the built-in
//! block helpers (`#each`, `#if`, `#unless`, `lookup`, `len`), the string
//! and list helpers `upper`, `lower`, `join`, and `default` are registered.

use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde_json::{Map, Value};

/// A template parse or execution failure, tagged with the template id.
#[derive(Debug)]
pub struct RenderError {
    pub template: String,
    source: handlebars::RenderError,
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "template {}: {}", self.template, self.source)
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

handlebars_helper!(upper: |value: str| value.to_uppercase());
handlebars_helper!(lower: |value: str| value.to_lowercase());
handlebars_helper!(join: |items: array, separator: str| {
    items.iter().map(scalar_string).collect::<Vec<_>>().join(separator)
});
handlebars_helper!(default_value: |value: Json, fallback: Json| {
    if value.is_null() { fallback.clone() } else { value.clone() }
});

fn registry() -> Handlebars<'static> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(no_escape);
    registry.register_helper("upper", Box::new(upper));
    registry.register_helper("lower", Box::new(lower));
    registry.register_helper("join", Box::new(join));
    registry.register_helper("default", Box::new(default_value));
    registry
}

/// Renders a template body against the merged metadata. `name` tags errors
/// with the template id; output is re-rendered on every call.
pub fn render(name: &str, contents: &str, data: &Map<String, Value>) -> Result<String, RenderError> {
    registry()
        .render_template(contents, data)
        .map_err(|source| RenderError {
            template: name.to_string(),
            source,
        })
}
