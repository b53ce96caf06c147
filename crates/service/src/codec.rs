//! Lenient decoding of stored values.
//!
//! Different writers have stored the same logical value as a JSON document, a
//! JSON string wrapping a JSON document, or a bare scalar. Readers go through
//! these helpers so every shape is accepted.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::errors::ServiceError;

/// Parse `raw` as `T`, unwrapping one level of string double-encoding.
pub fn decode_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    if let Ok(v) = serde_json::from_str::<T>(raw) {
        return Some(v);
    }
    let inner = serde_json::from_str::<String>(raw).ok()?;
    serde_json::from_str::<T>(&inner).ok()
}

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ServiceError> {
    serde_json::to_string(value).map_err(|e| ServiceError::Store(format!("encode: {e}")))
}

/// `true`, `1` and `yes` in any JSON or bare spelling.
pub fn parse_flag(raw: &str) -> bool {
    let truthy = |s: &str| matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes");
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Bool(b)) => b,
        Ok(Value::Number(n)) => n.as_f64() == Some(1.0),
        Ok(Value::String(s)) => truthy(&s),
        Ok(_) => false,
        Err(_) => truthy(raw),
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parsed JSON with a string-wrapped document unwrapped once.
fn unwrap_value(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw).ok()? {
        Value::String(s) => Some(serde_json::from_str::<Value>(&s).unwrap_or(Value::String(s))),
        v => Some(v),
    }
}

fn list_from(raw: &str, item: impl Fn(&Value) -> Option<String>) -> Vec<String> {
    match unwrap_value(raw) {
        Some(Value::Array(items)) => items.iter().filter_map(&item).filter(|s| !s.is_empty()).collect(),
        Some(Value::Object(_)) | Some(Value::Null) => Vec::new(),
        Some(scalar) => scalar_text(&scalar).filter(|s| !s.is_empty()).into_iter().collect(),
        None if !raw.trim().is_empty() => vec![raw.trim().to_string()],
        None => Vec::new(),
    }
}

/// Array of strings; scalars are stringified and a bare string is a one-item list.
pub fn decode_string_list(raw: &str) -> Vec<String> {
    list_from(raw, scalar_text)
}

/// Like `decode_string_list`, also accepting `{ "zip": ... }` items.
pub fn decode_zip_list(raw: &str) -> Vec<String> {
    list_from(raw, |v| match v {
        Value::Object(obj) => obj.get("zip").and_then(scalar_text),
        other => scalar_text(other),
    })
}
