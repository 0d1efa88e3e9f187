//! Error types for simple-dbus.

use dbus_wire::WireError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed signature, rejected before any value is touched
    Signature,
    /// A host value's type does not match the wire type
    TypeMismatch,
    /// Wrong arity: too few arguments, non-pair dict entry, ...
    Structure,
    /// A well-typed string failed a secondary grammar check
    Validation,
    /// A wire type with no encoder
    Unsupported,
    /// Malformed introspection document
    Document,
    /// Internal builder or marshaling failure
    Wire,
}

/// Failure encoding one value. The message is in parentheses so it can be
/// appended to the argument context.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("(invalid signature)")]
    InvalidSignature,

    #[error("(too few arguments)")]
    TooFewArguments,

    #[error("({expected} expected, got {actual})")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("({0} is not a valid signature)")]
    InvalidSignatureValue(String),

    #[error("(string contains a NUL byte)")]
    EmbeddedNul,

    #[error("(invalid variant signature)")]
    InvalidVariantSignature,

    #[error("(DICT_ENTRY key must be a basic type)")]
    DictKeyNotBasic,

    #[error("(DICT_ENTRY must be key-value pair)")]
    NotKeyValuePair,

    #[error("(adding type '{0}' not implemented yet)")]
    NotImplemented(String),

    #[error("({0})")]
    Wire(#[from] WireError),
}

impl EncodeError {
    pub(crate) fn mismatch(expected: &'static str, actual: &crate::Value) -> Self {
        EncodeError::TypeMismatch {
            expected,
            actual: actual.type_name(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EncodeError::InvalidSignature => ErrorKind::Signature,
            EncodeError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            EncodeError::TooFewArguments
            | EncodeError::DictKeyNotBasic
            | EncodeError::NotKeyValuePair => ErrorKind::Structure,
            EncodeError::InvalidSignatureValue(_)
            | EncodeError::EmbeddedNul
            | EncodeError::InvalidVariantSignature => ErrorKind::Validation,
            EncodeError::NotImplemented(_) => ErrorKind::Unsupported,
            EncodeError::Wire(_) => ErrorKind::Wire,
        }
    }
}

/// Failure parsing an introspection document.
#[derive(Debug, Error)]
pub enum IntrospectError {
    #[error("XML error at position {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Malformed document at position {position}: {reason}")]
    Malformed { position: usize, reason: String },
}

/// Errors that can occur in simple-dbus
#[derive(Debug, Error)]
pub enum Error {
    /// An argument could not be encoded. `ordinal` is 1-based.
    #[error("type error adding value #{ordinal} of '{signature}' {source}")]
    Argument {
        ordinal: usize,
        signature: String,
        #[source]
        source: EncodeError,
    },

    #[error("Error parsing introspection data")]
    Introspection(#[from] IntrospectError),

    #[error(transparent)]
    Wire(#[from] WireError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Argument { source, .. } => source.kind(),
            Error::Introspection(_) => ErrorKind::Document,
            Error::Wire(_) => ErrorKind::Wire,
        }
    }

    /// The 1-based ordinal of the failing argument, if any.
    pub fn ordinal(&self) -> Option<usize> {
        match self {
            Error::Argument { ordinal, .. } => Some(*ordinal),
            _ => None,
        }
    }
}
