//! Typed field accessors over `serde_json::Value`.
//!
//! Layer payloads are self-describing JSON trees read field by field, so
//! decode failures name the offending field instead of surfacing as an
//! opaque deserialization error. A missing key and a present-but-empty
//! array are distinct conditions here; callers rely on that.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DecodeError;

/// Parses a raw reply body into a JSON tree.
pub fn parse(body: &[u8]) -> Result<Value, DecodeError> {
    serde_json::from_slice(body).map_err(|e| DecodeError::Malformed {
        detail: e.to_string(),
    })
}

/// Reads a required typed field.
pub fn get<T: DeserializeOwned>(value: &Value, field: &'static str) -> Result<T, DecodeError> {
    let v = value
        .get(field)
        .ok_or(DecodeError::MissingField { field })?;
    serde_json::from_value(v.clone()).map_err(|e| DecodeError::BadField {
        field,
        detail: e.to_string(),
    })
}

/// Reads a required array field. An empty array is valid; a missing key
/// is not.
pub fn get_array<'a>(value: &'a Value, field: &'static str) -> Result<&'a [Value], DecodeError> {
    let v = value
        .get(field)
        .ok_or(DecodeError::MissingField { field })?;
    v.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| DecodeError::BadField {
            field,
            detail: format!("expected array, got {v}"),
        })
}
