//! Mapping from type codes to encoders.

use dbus_wire::{ArgumentBuilder, SignatureCursor, TypeCode};

use super::{container, scalar};
use crate::error::EncodeError;
use crate::value::Value;

/// An encoder for one complete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoder {
    Boolean,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    String,
    ObjectPath,
    Signature,
    Array,
    Struct,
    Variant,
    /// Placeholder for types without an encoder; always fails.
    NotImplemented,
}

/// Select the encoder for the type under a cursor.
pub fn encoder_for(code: Option<TypeCode>) -> Encoder {
    match code {
        Some(TypeCode::Boolean) => Encoder::Boolean,
        Some(TypeCode::Byte) => Encoder::Byte,
        Some(TypeCode::Int16) => Encoder::Int16,
        Some(TypeCode::UInt16) => Encoder::UInt16,
        Some(TypeCode::Int32) => Encoder::Int32,
        Some(TypeCode::UInt32) => Encoder::UInt32,
        Some(TypeCode::Int64) => Encoder::Int64,
        Some(TypeCode::UInt64) => Encoder::UInt64,
        Some(TypeCode::Double) => Encoder::Double,
        Some(TypeCode::String) => Encoder::String,
        Some(TypeCode::ObjectPath) => Encoder::ObjectPath,
        Some(TypeCode::Signature) => Encoder::Signature,
        Some(TypeCode::Array) => Encoder::Array,
        Some(TypeCode::Struct) => Encoder::Struct,
        Some(TypeCode::Variant) => Encoder::Variant,
        // Dict entries are reached through their array, never directly
        Some(TypeCode::DictEntry) | Some(TypeCode::UnixFd) | None => Encoder::NotImplemented,
    }
}

impl Encoder {
    /// Encode `value` as the type under `cursor`, appending to `out`.
    pub fn encode(
        self,
        value: &Value,
        cursor: &SignatureCursor<'_>,
        out: &mut ArgumentBuilder,
    ) -> Result<(), EncodeError> {
        match self {
            Encoder::Boolean => scalar::boolean(value, out),
            Encoder::Byte => scalar::byte(value, out),
            Encoder::Int16 => scalar::int16(value, out),
            Encoder::UInt16 => scalar::uint16(value, out),
            Encoder::Int32 => scalar::int32(value, out),
            Encoder::UInt32 => scalar::uint32(value, out),
            Encoder::Int64 => scalar::int64(value, out),
            Encoder::UInt64 => scalar::uint64(value, out),
            Encoder::Double => scalar::double(value, out),
            Encoder::String => scalar::string(value, out),
            Encoder::ObjectPath => scalar::object_path(value, out),
            Encoder::Signature => scalar::signature(value, out),
            Encoder::Array => container::array(value, cursor, out),
            Encoder::Struct => container::structure(value, cursor, out),
            Encoder::Variant => container::variant(value, out),
            Encoder::NotImplemented => Err(EncodeError::NotImplemented(
                cursor.current_signature().to_string(),
            )),
        }
    }
}
