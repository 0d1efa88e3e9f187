//! Argument encoding and introspection parsing for a scripting-host D-Bus
//! binding.
//!
//! Scripts hand over loosely typed values (see [`Value`]) and a type
//! signature; the bus wants strictly typed arguments. This crate sits in
//! between:
//!
//! - **Encode** (`encode/`): signature-driven conversion of host values to
//!   wire values, with errors that name the failing argument
//! - **Decode** (`decode.rs`): the reverse mapping for incoming messages
//! - **Introspect** (`introspect/`): parsing of introspection XML into a
//!   lookup table of interfaces, methods, signals and properties
//!
//! The wire types themselves live in [`dbus_wire`].
//!
//! # Example
//!
//! ```rust
//! use simple_dbus::{encode, parse_introspection, Value};
//!
//! let xml = r#"<node>
//!   <interface name="org.example.Echo">
//!     <method name="Echo">
//!       <arg type="s" direction="in"/>
//!       <arg type="s" direction="out"/>
//!     </method>
//!   </interface>
//! </node>"#;
//!
//! let description = parse_introspection(xml, "/org/example/echo").unwrap();
//! let echo = description.method("org.example.Echo", "Echo").unwrap();
//! let message = encode(&echo.signature, &[Value::from("hello")]).unwrap();
//! assert_eq!(message.values().len(), 1);
//! ```

pub mod decode;
pub mod encode;
pub mod error;
pub mod introspect;
pub mod value;

// Re-export key types
pub use decode::{decode, decode_all, decode_body};
pub use encode::{encode, EncodedMessage};
pub use error::{EncodeError, Error, ErrorKind, IntrospectError, Result};
pub use introspect::{
    parse_introspection, Access, Interface, Introspection, Member, MemberKind, Property,
};
pub use value::{Number, Table, Value};

pub use dbus_wire;
