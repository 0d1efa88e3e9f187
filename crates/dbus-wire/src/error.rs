//! Error types for the D-Bus wire layer.

use thiserror::Error;

/// Why a type signature was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature is longer than {max} bytes")]
    TooLong { max: usize },

    #[error("unknown type code '{0}'")]
    UnknownTypeCode(char),

    #[error("unexpected '{0}'")]
    UnexpectedClose(char),

    #[error("signature ends inside a container")]
    Unterminated,

    #[error("array is missing its element type")]
    MissingArrayElement,

    #[error("struct has no members")]
    EmptyStruct,

    #[error("dict entry outside of an array")]
    DictEntryOutsideArray,

    #[error("dict entry key must be a basic type")]
    DictKeyNotBasic,

    #[error("dict entry must have exactly a key and a value")]
    DictEntryArity,

    #[error("array nesting exceeds {max} levels")]
    ArrayTooDeep { max: usize },

    #[error("struct nesting exceeds {max} levels")]
    StructTooDeep { max: usize },

    #[error("expected exactly one complete type")]
    NotSingleType,
}

/// Errors raised while building or (un)marshaling message bodies.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Invalid signature '{signature}': {reason}")]
    Signature {
        signature: String,
        #[source]
        reason: SignatureError,
    },

    #[error("Builder error: {0}")]
    Builder(String),

    #[error("Marshaling error: {0}")]
    Marshal(String),

    #[error("Value of type '{actual}' does not match signature '{expected}'")]
    Mismatch { expected: String, actual: String },
}

pub type Result<T> = std::result::Result<T, WireError>;
