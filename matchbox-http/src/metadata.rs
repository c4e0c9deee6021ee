//! Per-request metadata assembly.
//!
//! The merged document starts empty, absorbs Group then Profile metadata,
//! and finally the request labels under the single reserved key `label`.
//! Later sources win scalar conflicts; objects on both sides deep-merge.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde_json::{Map, Value};

use matchbox_storage::{Group, Profile};

/// Builds the template data document for one request.
pub fn merge_metadata(
    group: &Group,
    profile: &Profile,
    labels: &HashMap<String, String>,
) -> Map<String, Value> {
    let mut metadata = Map::new();
    deep_merge(&mut metadata, group.metadata.clone());
    deep_merge(&mut metadata, profile.metadata.clone());

    let label_map: Map<String, Value> = labels
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    let mut wrapper = Map::new();
    wrapper.insert("label".to_string(), Value::Object(label_map));
    deep_merge(&mut metadata, wrapper);

    metadata
}

/// Merges `src` into `dst`. Keys present on both sides recurse when both
/// values are objects; otherwise the `src` value replaces.
pub fn deep_merge(dst: &mut Map<String, Value>, src: Map<String, Value>) {
    for (key, value) in src {
        match (dst.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            (_, value) => {
                dst.insert(key, value);
            }
        }
    }
}

/// Serializes metadata as `KEY=value` lines, descending into nested objects
/// with `_`-joined upper-cased key paths. Arrays and nulls carry structure
/// the flat form cannot express and are skipped. Line order is unspecified.
pub fn render_env_file(root: &Map<String, Value>) -> String {
    let mut out = String::new();
    write_env(&mut out, "", root);
    out
}

fn write_env(out: &mut String, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let name = format!("{prefix}{key}");
        match value {
            Value::String(s) => {
                let _ = writeln!(out, "{}={s}", name.to_uppercase());
            }
            Value::Bool(b) => {
                let _ = writeln!(out, "{}={b}", name.to_uppercase());
            }
            Value::Number(n) => {
                let _ = writeln!(out, "{}={n}", name.to_uppercase());
            }
            Value::Object(nested) => write_env(out, &format!("{name}_"), nested),
            Value::Array(_) | Value::Null => {}
        }
    }
}
