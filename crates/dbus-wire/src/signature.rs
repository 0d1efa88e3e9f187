//! Type signatures: validation and a read-only cursor.
//!
//! A signature is a string of type codes. `validate` checks a whole
//! signature (zero or more complete types), `validate_single` checks that a
//! string is exactly one complete type. Both follow the D-Bus grammar:
//!
//! ```text
//! signature := type*
//! type      := basic | 'v' | 'a' type | 'a' '{' basic type '}' | '(' type+ ')'
//! ```
//!
//! plus the length limit of 255 bytes and 32 levels each of array and struct
//! nesting (dict entries count as structs).

use std::fmt;
use std::str::FromStr;

use crate::error::SignatureError;
use crate::types::TypeCode;

/// Longest signature the protocol allows.
pub const MAX_SIGNATURE_LEN: usize = 255;
/// Deepest array nesting the protocol allows.
pub const MAX_ARRAY_DEPTH: usize = 32;
/// Deepest struct / dict entry nesting the protocol allows.
pub const MAX_STRUCT_DEPTH: usize = 32;

/// Check that `sig` is a sequence of zero or more complete types.
pub fn validate(sig: &str) -> Result<(), SignatureError> {
    let bytes = sig.as_bytes();
    if bytes.len() > MAX_SIGNATURE_LEN {
        return Err(SignatureError::TooLong {
            max: MAX_SIGNATURE_LEN,
        });
    }
    let mut pos = 0;
    while pos < bytes.len() {
        pos = parse_single(bytes, pos, 0, 0)?;
    }
    Ok(())
}

/// Check that `sig` is exactly one complete type.
pub fn validate_single(sig: &str) -> Result<(), SignatureError> {
    let bytes = sig.as_bytes();
    if bytes.len() > MAX_SIGNATURE_LEN {
        return Err(SignatureError::TooLong {
            max: MAX_SIGNATURE_LEN,
        });
    }
    if bytes.is_empty() {
        return Err(SignatureError::NotSingleType);
    }
    let end = parse_single(bytes, 0, 0, 0)?;
    if end != bytes.len() {
        return Err(SignatureError::NotSingleType);
    }
    Ok(())
}

/// Parse one complete type starting at `pos`, returning the position just
/// past it.
fn parse_single(
    bytes: &[u8],
    pos: usize,
    arrays: usize,
    structs: usize,
) -> Result<usize, SignatureError> {
    let Some(&b) = bytes.get(pos) else {
        return Err(SignatureError::Unterminated);
    };
    match b {
        b')' | b'}' => Err(SignatureError::UnexpectedClose(b as char)),
        b'a' => {
            if arrays + 1 > MAX_ARRAY_DEPTH {
                return Err(SignatureError::ArrayTooDeep {
                    max: MAX_ARRAY_DEPTH,
                });
            }
            match bytes.get(pos + 1) {
                None => Err(SignatureError::MissingArrayElement),
                Some(b'{') => parse_dict_entry(bytes, pos + 1, arrays + 1, structs),
                Some(_) => parse_single(bytes, pos + 1, arrays + 1, structs),
            }
        }
        b'(' => {
            if structs + 1 > MAX_STRUCT_DEPTH {
                return Err(SignatureError::StructTooDeep {
                    max: MAX_STRUCT_DEPTH,
                });
            }
            let mut p = pos + 1;
            if bytes.get(p) == Some(&b')') {
                return Err(SignatureError::EmptyStruct);
            }
            loop {
                match bytes.get(p) {
                    None => return Err(SignatureError::Unterminated),
                    Some(b')') => return Ok(p + 1),
                    Some(_) => p = parse_single(bytes, p, arrays, structs + 1)?,
                }
            }
        }
        b'{' => Err(SignatureError::DictEntryOutsideArray),
        _ => match TypeCode::from_byte(b) {
            Some(_) => Ok(pos + 1),
            None => Err(SignatureError::UnknownTypeCode(b as char)),
        },
    }
}

/// Parse a dict entry whose `{` is at `pos`.
fn parse_dict_entry(
    bytes: &[u8],
    pos: usize,
    arrays: usize,
    structs: usize,
) -> Result<usize, SignatureError> {
    if structs + 1 > MAX_STRUCT_DEPTH {
        return Err(SignatureError::StructTooDeep {
            max: MAX_STRUCT_DEPTH,
        });
    }
    let key_pos = pos + 1;
    let Some(&key) = bytes.get(key_pos) else {
        return Err(SignatureError::Unterminated);
    };
    match key {
        b'}' => return Err(SignatureError::DictEntryArity),
        b')' => return Err(SignatureError::UnexpectedClose(')')),
        _ => match TypeCode::from_byte(key) {
            Some(code) if code.is_basic() => {}
            Some(_) => return Err(SignatureError::DictKeyNotBasic),
            None => return Err(SignatureError::UnknownTypeCode(key as char)),
        },
    }
    if bytes.get(key_pos + 1) == Some(&b'}') {
        return Err(SignatureError::DictEntryArity);
    }
    let end = parse_single(bytes, key_pos + 1, arrays, structs + 1)?;
    match bytes.get(end) {
        Some(b'}') => Ok(end + 1),
        None => Err(SignatureError::Unterminated),
        Some(_) => Err(SignatureError::DictEntryArity),
    }
}

/// Length of the complete type at the start of `bytes`.
///
/// Assumes a validated signature; on garbage it stops at the end of input.
fn single_type_len(bytes: &[u8]) -> usize {
    let mut i = 0;
    while bytes.get(i) == Some(&b'a') {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'(') | Some(b'{') => {
            let mut depth = 0usize;
            while let Some(&b) = bytes.get(i) {
                i += 1;
                match b {
                    b'(' | b'{' => depth += 1,
                    b')' | b'}' => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            return i;
                        }
                    }
                    _ => {}
                }
            }
            i
        }
        Some(_) => i + 1,
        None => i,
    }
}

// ============================================================================
// Signature
// ============================================================================

/// A validated type signature (zero or more complete types).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(String);

impl Signature {
    /// Validate and wrap a signature.
    pub fn new(sig: impl Into<String>) -> Result<Self, SignatureError> {
        let sig = sig.into();
        validate(&sig)?;
        Ok(Self(sig))
    }

    /// Validate and wrap a signature holding exactly one complete type.
    pub fn single(sig: impl Into<String>) -> Result<Self, SignatureError> {
        let sig = sig.into();
        validate_single(&sig)?;
        Ok(Self(sig))
    }

    /// Validate `element` as the element type of an array.
    ///
    /// Dict entry types such as `{sv}` are only valid here, never as a
    /// standalone signature.
    pub fn array_element(element: &str) -> Result<Self, SignatureError> {
        validate_single(&format!("a{element}"))?;
        Ok(Self(element.to_string()))
    }

    /// The empty signature.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Wrap a slice taken from an already validated signature.
    pub(crate) fn from_trusted(sig: &str) -> Self {
        Self(sig.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of bytes in the signature.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A cursor positioned at the first complete type.
    pub fn cursor(&self) -> SignatureCursor<'_> {
        SignatureCursor::new(self)
    }

    /// Number of complete types at the top level.
    pub fn count(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let mut cursor = self.cursor();
        let mut n = 1;
        while cursor.advance() {
            n += 1;
        }
        n
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Signature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Signature::new(s)
    }
}

impl TryFrom<&str> for Signature {
    type Error = SignatureError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Signature::new(s)
    }
}

// ============================================================================
// SignatureCursor
// ============================================================================

/// Read-only walker over the complete types of one signature level.
///
/// Cursors are cheap to copy. Recursing yields a new cursor over the
/// container's own element signature; the parent cursor is unaffected.
#[derive(Debug, Clone, Copy)]
pub struct SignatureCursor<'a> {
    sig: &'a str,
    pos: usize,
}

impl<'a> SignatureCursor<'a> {
    pub fn new(sig: &'a Signature) -> Self {
        Self {
            sig: sig.as_str(),
            pos: 0,
        }
    }

    /// The kind of the type under the cursor, `None` once exhausted.
    pub fn current_kind(&self) -> Option<TypeCode> {
        self.sig
            .as_bytes()
            .get(self.pos)
            .and_then(|b| TypeCode::from_byte(*b))
    }

    /// The complete type under the cursor, e.g. `a{sv}` or `i`.
    pub fn current_signature(&self) -> &'a str {
        &self.sig[self.pos..self.current_end()]
    }

    /// For an array, the kind of its element type.
    pub fn element_kind(&self) -> Option<TypeCode> {
        match self.current_kind()? {
            TypeCode::Array => self
                .sig
                .as_bytes()
                .get(self.pos + 1)
                .and_then(|b| TypeCode::from_byte(*b)),
            _ => None,
        }
    }

    /// Move to the next sibling. Returns false when there is none.
    pub fn advance(&mut self) -> bool {
        if self.pos >= self.sig.len() {
            return false;
        }
        self.pos = self.current_end();
        self.pos < self.sig.len()
    }

    /// A cursor over the element signature of the container under the cursor.
    ///
    /// Arrays yield their element type, structs and dict entries their
    /// members. Variants and basic types have no static element signature
    /// and yield `None`.
    pub fn recurse(&self) -> Option<SignatureCursor<'a>> {
        let end = self.current_end();
        match self.current_kind()? {
            TypeCode::Array => Some(SignatureCursor {
                sig: &self.sig[self.pos + 1..end],
                pos: 0,
            }),
            TypeCode::Struct | TypeCode::DictEntry => Some(SignatureCursor {
                sig: &self.sig[self.pos + 1..end - 1],
                pos: 0,
            }),
            _ => None,
        }
    }

    /// The whole signature this cursor walks over.
    pub fn level_signature(&self) -> &'a str {
        self.sig
    }

    /// The complete type under the cursor as an owned [`Signature`].
    pub fn to_signature(&self) -> Signature {
        Signature::from_trusted(self.current_signature())
    }

    fn current_end(&self) -> usize {
        let bytes = self.sig.as_bytes();
        if self.pos >= bytes.len() {
            return bytes.len();
        }
        self.pos + single_type_len(&bytes[self.pos..])
    }
}
