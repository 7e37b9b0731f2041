//! Redaction of credential-looking log fields.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Placeholder written in place of a redacted value.
pub const REDACTED: &str = "[REDACTED]";

const MAX_STRING_LEN: usize = 512;

const DENYLIST_KEYS: [&str; 8] = [
    "token",
    "access_token",
    "refresh_token",
    "authorization",
    "cookie",
    "password",
    "secret",
    "apikey",
];

pub(crate) fn sanitize_fields(fields: HashMap<String, Value>) -> HashMap<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| {
            let value = sanitize_value(&key, value);
            (key, value)
        })
        .collect()
}

fn sanitize_value(key: &str, value: Value) -> Value {
    if is_sensitive_key(key) {
        return Value::String(REDACTED.to_string());
    }

    match value {
        Value::String(s) => sanitize_string(s),
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                let v = sanitize_value(&k, v);
                out.insert(k, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| sanitize_value(key, item))
                .collect(),
        ),
        other => other,
    }
}

/// Strip secrets that slipped into free-form text.
pub(crate) fn sanitize_message(message: String) -> String {
    if looks_like_sensitive_value(&message) {
        REDACTED.to_string()
    } else {
        message
    }
}

fn sanitize_string(raw: String) -> Value {
    if looks_like_sensitive_value(&raw) {
        return Value::String(REDACTED.to_string());
    }
    if raw.len() > MAX_STRING_LEN {
        return Value::String(format!("[TRUNCATED:{} bytes]", raw.len()));
    }
    Value::String(raw)
}

fn looks_like_sensitive_value(raw: &str) -> bool {
    if raw.to_ascii_lowercase().starts_with("bearer ") {
        return true;
    }
    // JWT shape
    if raw.matches('.').count() == 2 && raw.len() > 40 && !raw.contains(' ') {
        return true;
    }
    is_long_hex(raw) || is_long_base64(raw)
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    DENYLIST_KEYS.iter().any(|entry| lower.contains(entry))
}

fn is_long_hex(value: &str) -> bool {
    value.len() > 48 && value.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_long_base64(value: &str) -> bool {
    value.len() > 48
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=' || c == '_')
}
