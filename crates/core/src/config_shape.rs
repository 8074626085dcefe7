//! Shape checks for opaque platform configuration blobs.

use serde_json::Value;

use crate::types::ConfigBlob;

/// Whether a single config value counts as "filled in".
///
/// `null`, empty / whitespace strings, empty arrays and empty objects do not.
fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// True when the blob carries no usable value at all.
///
/// An enabled configuration with a blank blob is "enable now, configure
/// later" and must never reach a provisioning call.
pub fn is_blank(config: &ConfigBlob) -> bool {
    !config.values().any(is_filled)
}

/// Required fields that are absent or unfilled, in declaration order.
pub fn missing_required_fields(config: &ConfigBlob, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|field| !config.get(**field).is_some_and(is_filled))
        .map(|field| field.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
