//! Encodings shared by plans and reports: sorted-key JSON, YAML, and the
//! content digest taken over the JSON form.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use wta_core::errors::{ErrorInfo, SweepError};

fn encoding_error(code: &str, payload: &str, err: impl ToString) -> SweepError {
    SweepError::Serde(ErrorInfo::new(code, err.to_string()).with_context("payload", payload))
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sorted(value)))
                    .collect(),
            )
        }
        Value::Array(items) => items.into_iter().map(sorted).collect(),
        other => other,
    }
}

/// Pretty JSON with object keys in lexical order at every depth; equal values
/// always give equal bytes.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SweepError> {
    let tree = serde_json::to_value(value)
        .map_err(|err| encoding_error("json_serialize", "json", err))?;
    serde_json::to_vec_pretty(&sorted(tree)).map_err(|err| encoding_error("json_write", "json", err))
}

/// Hex SHA-256 of the canonical JSON form of `value`.
pub fn content_digest<T: Serialize>(value: &T) -> Result<String, SweepError> {
    let digest = Sha256::digest(to_canonical_json_bytes(value)?);
    Ok(format!("{digest:x}"))
}

pub(crate) fn to_yaml_string<T: Serialize>(value: &T, payload: &str) -> Result<String, SweepError> {
    serde_yaml::to_string(value).map_err(|err| encoding_error("yaml_serialize", payload, err))
}

pub(crate) fn from_yaml_slice<T: DeserializeOwned>(
    data: &[u8],
    payload: &str,
) -> Result<T, SweepError> {
    serde_yaml::from_slice(data).map_err(|err| encoding_error("yaml_deserialize", payload, err))
}
