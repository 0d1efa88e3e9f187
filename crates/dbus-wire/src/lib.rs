//! Pure Rust building blocks for the D-Bus wire format.
//!
//! This crate knows nothing about connections or message headers. It covers
//! the parts of the protocol that describe and carry argument values:
//!
//! - **Types** (`types.rs`): the single-character type codes
//! - **Signatures** (`signature.rs`): grammar validation and a cursor for
//!   walking a signature level by level
//! - **Values** (`value.rs`): typed wire values
//! - **Builder** (`builder.rs`): a scoped, append-only argument builder
//! - **Marshal** (`marshal.rs`): little-endian body (un)marshaling
//!
//! # Example
//!
//! ```rust
//! use dbus_wire::{marshal, Signature, WireValue};
//!
//! let sig = Signature::new("is").unwrap();
//! let body = marshal::write_body(&[WireValue::Int32(7), WireValue::String("hi".into())]);
//! let values = marshal::read_body(&sig, body.freeze()).unwrap();
//! assert_eq!(values[0], WireValue::Int32(7));
//! ```

pub mod builder;
pub mod error;
pub mod marshal;
pub mod signature;
pub mod types;
pub mod value;

// Re-export key types
pub use builder::{ArgumentBuilder, ContainerKind};
pub use error::{Result, SignatureError, WireError};
pub use signature::{Signature, SignatureCursor};
pub use types::TypeCode;
pub use value::{Variant, WireValue};
