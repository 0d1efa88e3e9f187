//! D-Bus type codes.
//!
//! Every element of a type signature starts with one of these ASCII codes.
//! Basic types are a single character; containers carry a nested signature
//! (`a` + element type, `(` ... `)`, `{` key value `}`) or, for variants,
//! carry their signature inline with the value.

use std::fmt;

/// D-Bus type code: identifies the kind of a single complete type.
/// Values match the signature character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeCode {
    Byte = b'y',
    Boolean = b'b',
    Int16 = b'n',
    UInt16 = b'q',
    Int32 = b'i',
    UInt32 = b'u',
    Int64 = b'x',
    UInt64 = b't',
    Double = b'd',
    String = b's',
    ObjectPath = b'o',
    Signature = b'g',
    UnixFd = b'h',
    Array = b'a',
    Struct = b'(',
    Variant = b'v',
    DictEntry = b'{',
}

impl TypeCode {
    /// Parse from the signature character that opens a type.
    ///
    /// Closing brackets are not type codes and map to `None`.
    pub fn from_byte(b: u8) -> Option<TypeCode> {
        match b {
            b'y' => Some(TypeCode::Byte),
            b'b' => Some(TypeCode::Boolean),
            b'n' => Some(TypeCode::Int16),
            b'q' => Some(TypeCode::UInt16),
            b'i' => Some(TypeCode::Int32),
            b'u' => Some(TypeCode::UInt32),
            b'x' => Some(TypeCode::Int64),
            b't' => Some(TypeCode::UInt64),
            b'd' => Some(TypeCode::Double),
            b's' => Some(TypeCode::String),
            b'o' => Some(TypeCode::ObjectPath),
            b'g' => Some(TypeCode::Signature),
            b'h' => Some(TypeCode::UnixFd),
            b'a' => Some(TypeCode::Array),
            b'(' => Some(TypeCode::Struct),
            b'v' => Some(TypeCode::Variant),
            b'{' => Some(TypeCode::DictEntry),
            _ => None,
        }
    }

    /// The signature character for this type.
    pub fn as_char(self) -> char {
        self as u8 as char
    }

    /// Whether this is a basic type (usable as a dict entry key).
    pub fn is_basic(self) -> bool {
        !self.is_container()
    }

    /// Whether values of this type contain other values.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            TypeCode::Array | TypeCode::Struct | TypeCode::Variant | TypeCode::DictEntry
        )
    }

    /// Marshaling alignment in bytes.
    pub fn alignment(self) -> usize {
        match self {
            TypeCode::Byte | TypeCode::Signature | TypeCode::Variant => 1,
            TypeCode::Int16 | TypeCode::UInt16 => 2,
            TypeCode::Boolean
            | TypeCode::Int32
            | TypeCode::UInt32
            | TypeCode::String
            | TypeCode::ObjectPath
            | TypeCode::UnixFd
            | TypeCode::Array => 4,
            TypeCode::Int64
            | TypeCode::UInt64
            | TypeCode::Double
            | TypeCode::Struct
            | TypeCode::DictEntry => 8,
        }
    }

    /// Human readable name, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            TypeCode::Byte => "BYTE",
            TypeCode::Boolean => "BOOLEAN",
            TypeCode::Int16 => "INT16",
            TypeCode::UInt16 => "UINT16",
            TypeCode::Int32 => "INT32",
            TypeCode::UInt32 => "UINT32",
            TypeCode::Int64 => "INT64",
            TypeCode::UInt64 => "UINT64",
            TypeCode::Double => "DOUBLE",
            TypeCode::String => "STRING",
            TypeCode::ObjectPath => "OBJECT_PATH",
            TypeCode::Signature => "SIGNATURE",
            TypeCode::UnixFd => "UNIX_FD",
            TypeCode::Array => "ARRAY",
            TypeCode::Struct => "STRUCT",
            TypeCode::Variant => "VARIANT",
            TypeCode::DictEntry => "DICT_ENTRY",
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_byte_roundtrips_char() {
        for code in [
            TypeCode::Byte,
            TypeCode::Boolean,
            TypeCode::Int64,
            TypeCode::Signature,
            TypeCode::Array,
            TypeCode::Struct,
            TypeCode::DictEntry,
        ] {
            assert_eq!(TypeCode::from_byte(code.as_char() as u8), Some(code));
        }
    }

    #[test]
    fn test_closing_brackets_are_not_codes() {
        assert_eq!(TypeCode::from_byte(b')'), None);
        assert_eq!(TypeCode::from_byte(b'}'), None);
        assert_eq!(TypeCode::from_byte(b'z'), None);
    }

    #[test]
    fn test_basic_vs_container() {
        assert!(TypeCode::String.is_basic());
        assert!(TypeCode::UnixFd.is_basic());
        assert!(!TypeCode::Variant.is_basic());
        assert!(TypeCode::DictEntry.is_container());
    }
}
