//! Typed wire values.
//!
//! A [`WireValue`] is the Rust representation of one complete D-Bus value
//! as it appears in a message body. Containers own their children.

use crate::signature::Signature;
use crate::types::TypeCode;

/// A D-Bus value: anything that can be sent/received in a message body.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Byte(u8),
    Boolean(bool),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    String(String),
    ObjectPath(String),
    Signature(Signature),
    /// A homogeneous array. `element` is the signature every item conforms to.
    Array {
        element: Signature,
        items: Vec<WireValue>,
    },
    Struct(Vec<WireValue>),
    /// Only valid as an array item.
    DictEntry(Box<WireValue>, Box<WireValue>),
    Variant(Box<Variant>),
}

/// A self-describing value: an inner signature plus one value of that type.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub signature: Signature,
    pub value: WireValue,
}

impl WireValue {
    /// The type code of this value.
    pub fn type_code(&self) -> TypeCode {
        match self {
            WireValue::Byte(_) => TypeCode::Byte,
            WireValue::Boolean(_) => TypeCode::Boolean,
            WireValue::Int16(_) => TypeCode::Int16,
            WireValue::UInt16(_) => TypeCode::UInt16,
            WireValue::Int32(_) => TypeCode::Int32,
            WireValue::UInt32(_) => TypeCode::UInt32,
            WireValue::Int64(_) => TypeCode::Int64,
            WireValue::UInt64(_) => TypeCode::UInt64,
            WireValue::Double(_) => TypeCode::Double,
            WireValue::String(_) => TypeCode::String,
            WireValue::ObjectPath(_) => TypeCode::ObjectPath,
            WireValue::Signature(_) => TypeCode::Signature,
            WireValue::Array { .. } => TypeCode::Array,
            WireValue::Struct(_) => TypeCode::Struct,
            WireValue::DictEntry(..) => TypeCode::DictEntry,
            WireValue::Variant(_) => TypeCode::Variant,
        }
    }

    /// Compute the complete type signature of this value.
    ///
    /// Arrays report their declared element signature, so empty arrays are
    /// still fully typed.
    pub fn signature(&self) -> String {
        let mut out = String::new();
        self.write_signature(&mut out);
        out
    }

    fn write_signature(&self, out: &mut String) {
        match self {
            WireValue::Array { element, .. } => {
                out.push('a');
                out.push_str(element.as_str());
            }
            WireValue::Struct(members) => {
                out.push('(');
                for member in members {
                    member.write_signature(out);
                }
                out.push(')');
            }
            WireValue::DictEntry(key, value) => {
                out.push('{');
                key.write_signature(out);
                value.write_signature(out);
                out.push('}');
            }
            other => out.push(other.type_code().as_char()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::String(s) | WireValue::ObjectPath(s) => Some(s),
            WireValue::Signature(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            WireValue::Byte(n) => Some(*n as i64),
            WireValue::Int16(n) => Some(*n as i64),
            WireValue::UInt16(n) => Some(*n as i64),
            WireValue::Int32(n) => Some(*n as i64),
            WireValue::UInt32(n) => Some(*n as i64),
            WireValue::Int64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WireValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WireValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn into_variant(self) -> Option<Variant> {
        match self {
            WireValue::Variant(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether this array holds dict entries.
    pub fn is_dict(&self) -> bool {
        matches!(self, WireValue::Array { element, .. } if element.as_str().starts_with('{'))
    }
}
