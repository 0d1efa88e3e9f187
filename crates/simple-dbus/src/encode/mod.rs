//! Host values to D-Bus message arguments.
//!
//! [`encode`] walks a signature one complete type at a time, pairs each with
//! the next host value and hands both to the encoder for that type code.
//! Containers recurse through the same dispatch. The first failure aborts
//! the whole message and names the offending argument by ordinal.
//!
//! ```
//! use simple_dbus::{encode, Table, Value};
//!
//! let props = Table::from_pairs([("Volume", Value::variant("d", 0.5))]);
//! let message = encode("sa{sv}", &[Value::from("player"), Value::Table(props)]).unwrap();
//! assert_eq!(message.values().len(), 2);
//! ```

mod container;
mod dispatch;
mod scalar;

pub use dispatch::{encoder_for, Encoder};

use bytes::BytesMut;
use dbus_wire::{marshal, ArgumentBuilder, Signature, WireValue};

use crate::error::{EncodeError, Error, Result};
use crate::value::Value;

/// The encoded arguments of one outgoing message.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedMessage {
    signature: Signature,
    values: Vec<WireValue>,
}

impl EncodedMessage {
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Top-level arguments, one per complete type in the signature.
    pub fn values(&self) -> &[WireValue] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<WireValue> {
        self.values
    }

    /// Marshal the arguments as a little-endian message body.
    ///
    /// Arrays whose payload exceeds [`marshal::MAX_ARRAY_LEN`] are written
    /// as is; readers reject them.
    pub fn to_body(&self) -> BytesMut {
        marshal::write_body(&self.values)
    }
}

fn argument_error(ordinal: usize, signature: &str, source: EncodeError) -> Error {
    Error::Argument {
        ordinal,
        signature: signature.to_string(),
        source,
    }
}

/// Encode `values` as the arguments described by `signature`.
///
/// Values beyond the last complete type are ignored. An empty signature
/// yields an empty message.
pub fn encode(signature: &str, values: &[Value]) -> Result<EncodedMessage> {
    let sig = Signature::new(signature).map_err(|reason| {
        tracing::debug!("invalid signature {signature:?}: {reason}");
        argument_error(1, signature, EncodeError::InvalidSignature)
    })?;

    let mut out = ArgumentBuilder::new();
    if !sig.is_empty() {
        let mut cursor = sig.cursor();
        let mut ordinal = 1;
        loop {
            let Some(value) = values.get(ordinal - 1) else {
                return Err(argument_error(
                    ordinal,
                    signature,
                    EncodeError::TooFewArguments,
                ));
            };

            tracing::trace!(
                ordinal,
                signature = cursor.current_signature(),
                "encoding argument"
            );
            encoder_for(cursor.current_kind())
                .encode(value, &cursor, &mut out)
                .map_err(|source| argument_error(ordinal, signature, source))?;

            if !cursor.advance() {
                break;
            }
            ordinal += 1;
        }
    }

    let values = out.finish()?;
    tracing::debug!(signature, count = values.len(), "encoded message arguments");
    Ok(EncodedMessage {
        signature: sig,
        values,
    })
}
