//! Binary serialization/deserialization of message bodies.
//!
//! Values are marshaled little-endian. Every value is aligned to its natural
//! boundary (see [`TypeCode::alignment`]) relative to the start of the body;
//! since the body itself starts on an 8-byte boundary inside a message, that
//! is the same as aligning relative to the message. Strings and object paths
//! carry a u32 length and a trailing NUL, signatures a u8 length and a
//! trailing NUL. Arrays carry a u32 byte length that excludes the padding
//! between the length and the first element.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};
use crate::signature::{Signature, SignatureCursor};
use crate::types::TypeCode;
use crate::value::{Variant, WireValue};

/// Largest array payload the protocol allows (64 MiB).
pub const MAX_ARRAY_LEN: usize = 1 << 26;

/// Deepest container nesting a body may have. The builder refuses to open
/// deeper scopes and the reader rejects deeper input.
pub const MAX_DEPTH: usize = 64;

// ============================================================================
// Writing
// ============================================================================

/// Marshal the top-level values of a body.
pub fn write_body(values: &[WireValue]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(256);
    for value in values {
        write_value(&mut buf, value);
    }
    buf
}

/// Write one value, padding first to its alignment.
pub fn write_value(buf: &mut BytesMut, value: &WireValue) {
    pad_to(buf, value.type_code().alignment());
    match value {
        WireValue::Byte(b) => buf.put_u8(*b),
        WireValue::Boolean(b) => buf.put_u32_le(u32::from(*b)),
        WireValue::Int16(n) => buf.put_i16_le(*n),
        WireValue::UInt16(n) => buf.put_u16_le(*n),
        WireValue::Int32(n) => buf.put_i32_le(*n),
        WireValue::UInt32(n) => buf.put_u32_le(*n),
        WireValue::Int64(n) => buf.put_i64_le(*n),
        WireValue::UInt64(n) => buf.put_u64_le(*n),
        WireValue::Double(d) => buf.put_f64_le(*d),
        WireValue::String(s) | WireValue::ObjectPath(s) => write_string(buf, s),
        WireValue::Signature(sig) => write_signature(buf, sig.as_str()),
        WireValue::Array { element, items } => {
            let len_pos = buf.len();
            buf.put_u32_le(0);
            pad_to(buf, element_alignment(element));
            let start = buf.len();
            for item in items {
                write_value(buf, item);
            }
            // Patched afterwards: the length is only known once items are written
            let len = (buf.len() - start) as u32;
            buf[len_pos..len_pos + 4].copy_from_slice(&len.to_le_bytes());
        }
        WireValue::Struct(members) => {
            for member in members {
                write_value(buf, member);
            }
        }
        WireValue::DictEntry(key, value) => {
            write_value(buf, key);
            write_value(buf, value);
        }
        WireValue::Variant(variant) => {
            write_signature(buf, variant.signature.as_str());
            write_value(buf, &variant.value);
        }
    }
}

/// Write a string with u32 length prefix and NUL terminator.
pub fn write_string(buf: &mut BytesMut, s: &str) {
    buf.put_u32_le(s.len() as u32);
    buf.put_slice(s.as_bytes());
    buf.put_u8(0);
}

/// Write a signature with u8 length prefix and NUL terminator.
pub fn write_signature(buf: &mut BytesMut, sig: &str) {
    buf.put_u8(sig.len() as u8);
    buf.put_slice(sig.as_bytes());
    buf.put_u8(0);
}

fn pad_to(buf: &mut BytesMut, align: usize) {
    while buf.len() % align != 0 {
        buf.put_u8(0);
    }
}

fn element_alignment(element: &Signature) -> usize {
    element
        .as_str()
        .as_bytes()
        .first()
        .and_then(|b| TypeCode::from_byte(*b))
        .map_or(1, TypeCode::alignment)
}

// ============================================================================
// Reading
// ============================================================================

/// Unmarshal a body against its signature.
///
/// The whole body must be consumed; trailing bytes are an error.
pub fn read_body(signature: &Signature, data: Bytes) -> Result<Vec<WireValue>> {
    let mut reader = BodyReader::new(data);
    let mut values = Vec::with_capacity(signature.count());
    if !signature.is_empty() {
        let mut cursor = signature.cursor();
        loop {
            values.push(reader.read_value(&cursor, 0)?);
            if !cursor.advance() {
                break;
            }
        }
    }
    if reader.buf.has_remaining() {
        return Err(WireError::Marshal(format!(
            "{} trailing bytes after body",
            reader.buf.remaining()
        )));
    }
    Ok(values)
}

struct BodyReader {
    buf: Bytes,
    total: usize,
}

impl BodyReader {
    fn new(buf: Bytes) -> Self {
        let total = buf.len();
        Self { buf, total }
    }

    fn offset(&self) -> usize {
        self.total - self.buf.remaining()
    }

    fn align(&mut self, align: usize) -> Result<()> {
        let pad = (align - self.offset() % align) % align;
        ensure_remaining(&self.buf, pad, "padding")?;
        for _ in 0..pad {
            if self.buf.get_u8() != 0 {
                return Err(WireError::Marshal(format!(
                    "non-zero padding byte at offset {}",
                    self.offset() - 1
                )));
            }
        }
        Ok(())
    }

    fn read_value(&mut self, cursor: &SignatureCursor<'_>, depth: usize) -> Result<WireValue> {
        if depth > MAX_DEPTH {
            return Err(WireError::Marshal(format!(
                "container nesting exceeds {MAX_DEPTH} levels"
            )));
        }
        let code = cursor
            .current_kind()
            .ok_or_else(|| WireError::Marshal("signature exhausted".into()))?;
        self.align(code.alignment())?;

        match code {
            TypeCode::Byte => {
                ensure_remaining(&self.buf, 1, "byte")?;
                Ok(WireValue::Byte(self.buf.get_u8()))
            }
            TypeCode::Boolean => {
                ensure_remaining(&self.buf, 4, "boolean")?;
                match self.buf.get_u32_le() {
                    0 => Ok(WireValue::Boolean(false)),
                    1 => Ok(WireValue::Boolean(true)),
                    other => Err(WireError::Marshal(format!(
                        "boolean value must be 0 or 1, got {other}"
                    ))),
                }
            }
            TypeCode::Int16 => {
                ensure_remaining(&self.buf, 2, "int16")?;
                Ok(WireValue::Int16(self.buf.get_i16_le()))
            }
            TypeCode::UInt16 => {
                ensure_remaining(&self.buf, 2, "uint16")?;
                Ok(WireValue::UInt16(self.buf.get_u16_le()))
            }
            TypeCode::Int32 => {
                ensure_remaining(&self.buf, 4, "int32")?;
                Ok(WireValue::Int32(self.buf.get_i32_le()))
            }
            TypeCode::UInt32 => {
                ensure_remaining(&self.buf, 4, "uint32")?;
                Ok(WireValue::UInt32(self.buf.get_u32_le()))
            }
            TypeCode::Int64 => {
                ensure_remaining(&self.buf, 8, "int64")?;
                Ok(WireValue::Int64(self.buf.get_i64_le()))
            }
            TypeCode::UInt64 => {
                ensure_remaining(&self.buf, 8, "uint64")?;
                Ok(WireValue::UInt64(self.buf.get_u64_le()))
            }
            TypeCode::Double => {
                ensure_remaining(&self.buf, 8, "double")?;
                Ok(WireValue::Double(self.buf.get_f64_le()))
            }
            TypeCode::String => Ok(WireValue::String(self.read_string()?)),
            TypeCode::ObjectPath => Ok(WireValue::ObjectPath(self.read_string()?)),
            TypeCode::Signature => {
                let sig = self.read_signature()?;
                let sig = Signature::new(sig.clone()).map_err(|reason| WireError::Signature {
                    signature: sig,
                    reason,
                })?;
                Ok(WireValue::Signature(sig))
            }
            TypeCode::UnixFd => Err(WireError::Marshal(
                "unix file descriptors are not supported".into(),
            )),
            TypeCode::Array => {
                ensure_remaining(&self.buf, 4, "array length")?;
                let len = self.buf.get_u32_le() as usize;
                if len > MAX_ARRAY_LEN {
                    return Err(WireError::Marshal(format!(
                        "array length {len} exceeds maximum {MAX_ARRAY_LEN}"
                    )));
                }
                let element = cursor
                    .recurse()
                    .ok_or_else(|| WireError::Marshal("array without element type".into()))?;
                let element_code = element
                    .current_kind()
                    .ok_or_else(|| WireError::Marshal("array without element type".into()))?;
                self.align(element_code.alignment())?;
                ensure_remaining(&self.buf, len, "array")?;

                let end = self.offset() + len;
                let mut items = Vec::new();
                while self.offset() < end {
                    items.push(self.read_value(&element, depth + 1)?);
                }
                if self.offset() != end {
                    return Err(WireError::Marshal(
                        "array elements overran the declared length".into(),
                    ));
                }
                Ok(WireValue::Array {
                    element: element.to_signature(),
                    items,
                })
            }
            TypeCode::Struct => {
                let mut members = cursor
                    .recurse()
                    .ok_or_else(|| WireError::Marshal("struct without members".into()))?;
                let mut values = Vec::new();
                loop {
                    values.push(self.read_value(&members, depth + 1)?);
                    if !members.advance() {
                        break;
                    }
                }
                Ok(WireValue::Struct(values))
            }
            TypeCode::DictEntry => {
                let mut members = cursor
                    .recurse()
                    .ok_or_else(|| WireError::Marshal("dict entry without members".into()))?;
                let key = self.read_value(&members, depth + 1)?;
                if !members.advance() {
                    return Err(WireError::Marshal("dict entry without value type".into()));
                }
                let value = self.read_value(&members, depth + 1)?;
                Ok(WireValue::DictEntry(Box::new(key), Box::new(value)))
            }
            TypeCode::Variant => {
                let sig = self.read_signature()?;
                let signature =
                    Signature::single(sig.clone()).map_err(|reason| WireError::Signature {
                        signature: sig,
                        reason,
                    })?;
                let value = self.read_value(&signature.cursor(), depth + 1)?;
                Ok(WireValue::Variant(Box::new(Variant { signature, value })))
            }
        }
    }

    fn read_string(&mut self) -> Result<String> {
        ensure_remaining(&self.buf, 4, "string length")?;
        let len = self.buf.get_u32_le() as usize;
        self.read_terminated(len, "string")
    }

    fn read_signature(&mut self) -> Result<String> {
        ensure_remaining(&self.buf, 1, "signature length")?;
        let len = self.buf.get_u8() as usize;
        self.read_terminated(len, "signature")
    }

    fn read_terminated(&mut self, len: usize, what: &str) -> Result<String> {
        ensure_remaining(&self.buf, len + 1, what)?;
        let bytes = self.buf.copy_to_bytes(len);
        if self.buf.get_u8() != 0 {
            return Err(WireError::Marshal(format!("{what} is not NUL-terminated")));
        }
        let s = String::from_utf8(bytes.to_vec())
            .map_err(|e| WireError::Marshal(format!("invalid UTF-8 in {what}: {e}")))?;
        if s.contains('\0') {
            return Err(WireError::Marshal(format!("{what} contains a NUL byte")));
        }
        Ok(s)
    }
}

fn ensure_remaining(buf: &Bytes, needed: usize, what: &str) -> Result<()> {
    if buf.remaining() < needed {
        Err(WireError::Marshal(format!(
            "unexpected end of data reading {what}: need {needed} bytes, have {}",
            buf.remaining()
        )))
    } else {
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(s: &str) -> Signature {
        Signature::new(s).unwrap()
    }

    #[test]
    fn test_int32_and_string_layout() {
        let buf = write_body(&[WireValue::Int32(1), WireValue::String("ab".into())]);
        assert_eq!(buf.as_ref(), &[1, 0, 0, 0, 2, 0, 0, 0, b'a', b'b', 0]);
    }

    #[test]
    fn test_padding_after_byte() {
        let buf = write_body(&[WireValue::Byte(5), WireValue::UInt32(1)]);
        assert_eq!(buf.as_ref(), &[5, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_array_length_excludes_element_padding() {
        let value = WireValue::Array {
            element: Signature::array_element("x").unwrap(),
            items: vec![WireValue::Int64(7)],
        };
        let buf = write_body(std::slice::from_ref(&value));
        // length (4) + padding to 8 (4) + one int64 (8)
        assert_eq!(buf.len(), 16);
        assert_eq!(&buf[0..4], &8u32.to_le_bytes());

        let read = read_body(&sig("ax"), buf.freeze()).unwrap();
        assert_eq!(read, vec![value]);
    }

    #[test]
    fn test_signature_layout() {
        let buf = write_body(&[WireValue::Signature(sig("ai"))]);
        assert_eq!(buf.as_ref(), &[2, b'a', b'i', 0]);
    }

    #[test]
    fn test_dict_with_variant_roundtrip() {
        let value = WireValue::Array {
            element: Signature::array_element("{sv}").unwrap(),
            items: vec![WireValue::DictEntry(
                Box::new(WireValue::String("k1".into())),
                Box::new(WireValue::Variant(Box::new(Variant {
                    signature: Signature::single("i").unwrap(),
                    value: WireValue::Int32(5),
                }))),
            )],
        };
        let body = write_body(std::slice::from_ref(&value)).freeze();
        let read = read_body(&sig("a{sv}"), body).unwrap();
        assert_eq!(read, vec![value]);
    }

    #[test]
    fn test_struct_roundtrip() {
        let values = vec![
            WireValue::Byte(1),
            WireValue::Struct(vec![
                WireValue::Boolean(true),
                WireValue::Double(2.5),
                WireValue::ObjectPath("/org/example".into()),
            ]),
            WireValue::Int16(-3),
        ];
        let body = write_body(&values).freeze();
        assert_eq!(read_body(&sig("y(bdo)n"), body).unwrap(), values);
    }

    #[test]
    fn test_empty_array_roundtrip() {
        let value = WireValue::Array {
            element: Signature::array_element("(ii)").unwrap(),
            items: vec![],
        };
        let body = write_body(std::slice::from_ref(&value)).freeze();
        assert_eq!(read_body(&sig("a(ii)"), body).unwrap(), vec![value]);
    }

    #[test]
    fn test_read_rejects_bad_boolean() {
        let body = Bytes::from_static(&[2, 0, 0, 0]);
        assert!(read_body(&sig("b"), body).is_err());
    }

    #[test]
    fn test_read_rejects_truncated_string() {
        let body = Bytes::from_static(&[5, 0, 0, 0, b'a']);
        assert!(read_body(&sig("s"), body).is_err());
    }

    #[test]
    fn test_read_rejects_trailing_bytes() {
        let body = Bytes::from_static(&[1, 0, 0, 0, 9]);
        assert!(read_body(&sig("u"), body).is_err());
    }

    #[test]
    fn test_read_rejects_invalid_variant_signature() {
        // variant signature "ii" is not a single complete type
        let body = Bytes::from_static(&[2, b'i', b'i', 0, 1, 0, 0, 0, 2, 0, 0, 0]);
        assert!(matches!(
            read_body(&sig("v"), body),
            Err(WireError::Signature { .. })
        ));
    }
}
