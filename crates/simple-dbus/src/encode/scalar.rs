//! Encoders for basic wire types.
//!
//! Integer encoders accept any host number and narrow it with wraparound;
//! there is no range check.

use std::borrow::Cow;

use dbus_wire::{ArgumentBuilder, Signature, WireValue};

use crate::error::EncodeError;
use crate::value::{Number, Value};

fn number(value: &Value) -> Result<Number, EncodeError> {
    value
        .to_number()
        .ok_or_else(|| EncodeError::mismatch("number", value))
}

fn text(value: &Value) -> Result<Cow<'_, str>, EncodeError> {
    value
        .to_str()
        .ok_or_else(|| EncodeError::mismatch("string", value))
}

/// Wire strings are NUL-terminated and may not contain NUL themselves.
fn wire_text(value: &Value) -> Result<String, EncodeError> {
    let s = text(value)?;
    if s.contains('\0') {
        return Err(EncodeError::EmbeddedNul);
    }
    Ok(s.into_owned())
}

pub fn boolean(value: &Value, out: &mut ArgumentBuilder) -> Result<(), EncodeError> {
    let b = value
        .as_bool()
        .ok_or_else(|| EncodeError::mismatch("boolean", value))?;
    out.append(WireValue::Boolean(b))?;
    Ok(())
}

pub fn byte(value: &Value, out: &mut ArgumentBuilder) -> Result<(), EncodeError> {
    let bits = number(value)?.wrapping_bits();
    out.append(WireValue::Byte(bits as u8))?;
    Ok(())
}

pub fn int16(value: &Value, out: &mut ArgumentBuilder) -> Result<(), EncodeError> {
    let bits = number(value)?.wrapping_bits();
    out.append(WireValue::Int16(bits as i16))?;
    Ok(())
}

pub fn uint16(value: &Value, out: &mut ArgumentBuilder) -> Result<(), EncodeError> {
    let bits = number(value)?.wrapping_bits();
    out.append(WireValue::UInt16(bits as u16))?;
    Ok(())
}

pub fn int32(value: &Value, out: &mut ArgumentBuilder) -> Result<(), EncodeError> {
    let bits = number(value)?.wrapping_bits();
    out.append(WireValue::Int32(bits as i32))?;
    Ok(())
}

pub fn uint32(value: &Value, out: &mut ArgumentBuilder) -> Result<(), EncodeError> {
    let bits = number(value)?.wrapping_bits();
    out.append(WireValue::UInt32(bits as u32))?;
    Ok(())
}

pub fn int64(value: &Value, out: &mut ArgumentBuilder) -> Result<(), EncodeError> {
    let bits = number(value)?.wrapping_bits();
    out.append(WireValue::Int64(bits as i64))?;
    Ok(())
}

pub fn uint64(value: &Value, out: &mut ArgumentBuilder) -> Result<(), EncodeError> {
    let bits = number(value)?.wrapping_bits();
    out.append(WireValue::UInt64(bits))?;
    Ok(())
}

pub fn double(value: &Value, out: &mut ArgumentBuilder) -> Result<(), EncodeError> {
    let d = number(value)?.to_f64();
    out.append(WireValue::Double(d))?;
    Ok(())
}

pub fn string(value: &Value, out: &mut ArgumentBuilder) -> Result<(), EncodeError> {
    out.append(WireValue::String(wire_text(value)?))?;
    Ok(())
}

pub fn object_path(value: &Value, out: &mut ArgumentBuilder) -> Result<(), EncodeError> {
    out.append(WireValue::ObjectPath(wire_text(value)?))?;
    Ok(())
}

/// The one basic type with a grammar check: the string must itself be a
/// valid signature.
pub fn signature(value: &Value, out: &mut ArgumentBuilder) -> Result<(), EncodeError> {
    let s = text(value)?.into_owned();
    let sig = match Signature::new(s.as_str()) {
        Ok(sig) => sig,
        Err(reason) => {
            tracing::trace!("rejecting signature value {s:?}: {reason}");
            return Err(EncodeError::InvalidSignatureValue(s));
        }
    };
    out.append(WireValue::Signature(sig))?;
    Ok(())
}
