//! Lenient string fields
//!
//! YAML resolves unquoted `1234` or `true` to numbers and booleans. Fields
//! that are text for us (hostnames, group names, GECOS) accept any scalar
//! and keep its text form; `null` counts as absent.

use serde::Deserialize;
use serde::de::{Deserializer, Error};
use serde_yaml::Value;

fn text<E: Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Tagged(tagged) => text(tagged.value),
        Value::Sequence(_) => Err(E::custom("invalid type: sequence, expected a scalar")),
        Value::Mapping(_) => Err(E::custom("invalid type: mapping, expected a scalar")),
    }
}

/// Required text; `null` becomes an empty string
pub(super) fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    optional(deserializer).map(Option::unwrap_or_default)
}

/// Optional text
pub(super) fn optional<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    text(Value::deserialize(deserializer)?)
}

/// List of text values; `null` becomes an empty list, null items are dropped
pub(super) fn list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .into_iter()
            .filter_map(|item| text(item).transpose())
            .collect(),
        other => Err(D::Error::custom(format!(
            "invalid type: {}, expected a sequence",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
