//! JSON to host value conversion.
//!
//! JSON arrays become sequence tables and objects become string-keyed
//! tables, so a variant is written as `{"signature": "i", "value": 5}`.

use serde_json::Value as Json;
use simple_dbus::{Table, Value};

pub fn from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(u) = n.as_u64() {
                // Same bits as the unsigned value once narrowed to 't'
                Value::Integer(u as i64)
            } else {
                Value::Number(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Table(items.iter().map(from_json).collect()),
        Json::Object(fields) => Value::Table(Table::from_pairs(
            fields.iter().map(|(k, v)| (k.as_str(), from_json(v))),
        )),
    }
}

/// Parse a JSON array into one host value per message argument.
pub fn arguments(text: &str) -> anyhow::Result<Vec<Value>> {
    let json: Json = serde_json::from_str(text)?;
    match json {
        Json::Array(items) => Ok(items.iter().map(from_json).collect()),
        other => anyhow::bail!("arguments must be a JSON array, got {}", kind(&other)),
    }
}

fn kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

/// Format bytes as rows of 16 space-separated hex pairs.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .chunks(16)
        .map(|row| {
            row.iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
