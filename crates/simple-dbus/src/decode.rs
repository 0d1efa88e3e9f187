//! D-Bus message arguments back to host values.
//!
//! The mapping mirrors [`encode`](crate::encode): integers of every width
//! become host integers, strings, object paths and signatures become
//! strings, arrays and structs become sequence tables, dictionaries become
//! keyed tables and variants become `{signature, value}` records.

use bytes::Bytes;
use dbus_wire::{marshal, Signature, WireValue};

use crate::error::Result;
use crate::value::{Table, Value};

/// Convert one wire value to a host value.
pub fn decode(value: &WireValue) -> Value {
    match value {
        WireValue::Byte(b) => Value::Integer(i64::from(*b)),
        WireValue::Boolean(b) => Value::Boolean(*b),
        WireValue::Int16(n) => Value::Integer(i64::from(*n)),
        WireValue::UInt16(n) => Value::Integer(i64::from(*n)),
        WireValue::Int32(n) => Value::Integer(i64::from(*n)),
        WireValue::UInt32(n) => Value::Integer(i64::from(*n)),
        WireValue::Int64(n) => Value::Integer(*n),
        // Above i64::MAX this wraps, which re-encodes to the same bits
        WireValue::UInt64(n) => Value::Integer(*n as i64),
        WireValue::Double(d) => Value::Number(*d),
        WireValue::String(s) | WireValue::ObjectPath(s) => Value::String(s.clone()),
        WireValue::Signature(sig) => Value::String(sig.as_str().to_string()),
        WireValue::Array { items, .. } if value.is_dict() => {
            let mut table = Table::new();
            for item in items {
                if let WireValue::DictEntry(key, val) = item {
                    table.set(decode(key), decode(val));
                }
            }
            Value::Table(table)
        }
        WireValue::Array { items, .. } | WireValue::Struct(items) => {
            Value::Table(items.iter().map(decode).collect())
        }
        WireValue::DictEntry(key, val) => {
            Value::Table([decode(key), decode(val)].into_iter().collect())
        }
        WireValue::Variant(variant) => {
            Value::variant(variant.signature.as_str(), decode(&variant.value))
        }
    }
}

/// Convert every top-level argument of a message.
pub fn decode_all(values: &[WireValue]) -> Vec<Value> {
    values.iter().map(decode).collect()
}

/// Unmarshal a little-endian body and convert its arguments.
pub fn decode_body(signature: &str, body: Bytes) -> Result<Vec<Value>> {
    let signature = Signature::new(signature).map_err(|reason| {
        dbus_wire::WireError::Signature {
            signature: signature.to_string(),
            reason,
        }
    })?;
    let values = marshal::read_body(&signature, body)?;
    Ok(decode_all(&values))
}
