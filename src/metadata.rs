//! Free-form metadata: stored as an opaque text blob, interpreted as a JSON
//! object only when two blobs have to be merged.

use serde_json::{Map, Value};

use crate::error::{Result, RiboError};

/// Parse a metadata blob. It must be a JSON object.
pub fn parse_metadata(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(RiboError::InvalidMetadata {
            reason: format!("expected a JSON object, found {}", kind(&other)),
        }),
        Err(e) => Err(RiboError::InvalidMetadata { reason: e.to_string() }),
    }
}

/// Check that `text` is a metadata object and normalise its formatting.
pub fn normalize_metadata(text: &str) -> Result<String> {
    let map = parse_metadata(text)?;
    serde_json::to_string_pretty(&Value::Object(map))
        .map_err(|e| RiboError::InvalidMetadata { reason: e.to_string() })
}

/// Merge blobs left to right; on a key conflict the later blob wins.
/// Returns `None` when no blob is present.
pub fn merge_metadata<'a, I>(blobs: I) -> Result<Option<String>>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut merged: Option<Map<String, Value>> = None;
    for text in blobs.into_iter().flatten() {
        let map = parse_metadata(text)?;
        merged.get_or_insert_with(Map::new).extend(map);
    }
    merged
        .map(|m| serde_json::to_string_pretty(&Value::Object(m)))
        .transpose()
        .map_err(|e| RiboError::InvalidMetadata { reason: e.to_string() })
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
