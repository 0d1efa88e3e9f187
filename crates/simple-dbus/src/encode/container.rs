//! Encoders for arrays, dictionaries, structs and variants.
//!
//! Every encoder here opens exactly one builder scope and leaves the
//! builder as it found it when anything inside fails.

use dbus_wire::{ArgumentBuilder, ContainerKind, Signature, SignatureCursor, TypeCode};

use super::dispatch::encoder_for;
use crate::error::EncodeError;
use crate::value::{Table, Value};

static NIL: Value = Value::Nil;

fn expect_table(value: &Value) -> Result<&Table, EncodeError> {
    value
        .as_table()
        .ok_or_else(|| EncodeError::mismatch("table", value))
}

fn scoped(
    out: &mut ArgumentBuilder,
    kind: ContainerKind,
    fill: impl FnOnce(&mut ArgumentBuilder) -> Result<(), EncodeError>,
) -> Result<(), EncodeError> {
    out.scoped(kind, fill)
}

fn inner<'a>(cursor: &SignatureCursor<'a>) -> Result<SignatureCursor<'a>, EncodeError> {
    cursor
        .recurse()
        .ok_or_else(|| EncodeError::NotImplemented(cursor.current_signature().to_string()))
}

/// `a<T>`: the sequence part of a table, in order. Arrays of dict entries
/// go to [`dict`] instead.
pub fn array(
    value: &Value,
    cursor: &SignatureCursor<'_>,
    out: &mut ArgumentBuilder,
) -> Result<(), EncodeError> {
    if cursor.element_kind() == Some(TypeCode::DictEntry) {
        return dict(value, cursor, out);
    }

    let table = expect_table(value)?;
    let element = inner(cursor)?;
    let encoder = encoder_for(element.current_kind());

    scoped(out, ContainerKind::Array(element.to_signature()), |out| {
        for item in table.sequence() {
            encoder.encode(item, &element, out)?;
        }
        Ok(())
    })
}

/// `a{KV}`: every key/value pair of a table, one dict entry each.
pub fn dict(
    value: &Value,
    cursor: &SignatureCursor<'_>,
    out: &mut ArgumentBuilder,
) -> Result<(), EncodeError> {
    let table = expect_table(value)?;
    let entry = inner(cursor)?;
    let mut members = inner(&entry)?;

    if !members.current_kind().is_some_and(|code| code.is_basic()) {
        return Err(EncodeError::DictKeyNotBasic);
    }
    let key_cursor = members;
    let key_encoder = encoder_for(key_cursor.current_kind());

    if !members.advance() {
        return Err(EncodeError::NotKeyValuePair);
    }
    let value_cursor = members;
    let value_encoder = encoder_for(value_cursor.current_kind());

    if members.advance() {
        return Err(EncodeError::NotKeyValuePair);
    }

    scoped(out, ContainerKind::Array(entry.to_signature()), |out| {
        for (key, item) in table.pairs() {
            scoped(out, ContainerKind::DictEntry, |out| {
                key_encoder.encode(&key, &key_cursor, out)?;
                value_encoder.encode(item, &value_cursor, out)
            })?;
        }
        Ok(())
    })
}

/// `(T1T2...)`: positional fields 1..N of a table. Missing fields are nil,
/// extra fields are ignored.
pub fn structure(
    value: &Value,
    cursor: &SignatureCursor<'_>,
    out: &mut ArgumentBuilder,
) -> Result<(), EncodeError> {
    let table = expect_table(value)?;
    let mut members = inner(cursor)?;

    scoped(out, ContainerKind::Struct, |out| {
        let mut index = 1;
        loop {
            let field = table.get_index(index).unwrap_or(&NIL);
            encoder_for(members.current_kind()).encode(field, &members, out)?;
            if !members.advance() {
                return Ok(());
            }
            index += 1;
        }
    })
}

/// `v`: a table with a `signature` field naming one complete type and a
/// `value` field holding the payload.
pub fn variant(value: &Value, out: &mut ArgumentBuilder) -> Result<(), EncodeError> {
    let table = expect_table(value)?;

    let signature = table
        .field("signature")
        .and_then(Value::to_str)
        .and_then(|s| Signature::single(s.into_owned()).ok())
        .ok_or(EncodeError::InvalidVariantSignature)?;
    let payload = table.field("value").unwrap_or(&NIL);

    let cursor = signature.cursor();
    let encoder = encoder_for(cursor.current_kind());
    scoped(out, ContainerKind::Variant(signature.clone()), |out| {
        encoder.encode(payload, &cursor, out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbus_wire::WireValue;

    fn run(sig: &str, value: Value) -> Result<Vec<WireValue>, EncodeError> {
        let sig = Signature::new(sig).unwrap();
        let cursor = sig.cursor();
        let mut out = ArgumentBuilder::new();
        encoder_for(cursor.current_kind()).encode(&value, &cursor, &mut out)?;
        Ok(out.finish().unwrap())
    }

    #[test]
    fn test_array_of_integers() {
        let items = vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)];
        let values = run("ai", Value::from(items)).unwrap();
        assert_eq!(
            values,
            vec![WireValue::Array {
                element: Signature::new("i").unwrap(),
                items: vec![
                    WireValue::Int32(1),
                    WireValue::Int32(2),
                    WireValue::Int32(3)
                ],
            }]
        );
    }

    #[test]
    fn test_array_ignores_map_part() {
        let mut table: Table = vec![Value::from("a")].into_iter().collect();
        table.set("extra", "ignored");
        let values = run("as", Value::Table(table)).unwrap();
        assert_eq!(
            values,
            vec![WireValue::Array {
                element: Signature::new("s").unwrap(),
                items: vec![WireValue::String("a".into())],
            }]
        );
    }

    #[test]
    fn test_array_requires_table() {
        let err = run("ai", Value::Integer(1)).unwrap_err();
        assert_eq!(err.to_string(), "(table expected, got number)");
    }

    #[test]
    fn test_dict_entries() {
        let table = Table::from_pairs([("k", 1)]);
        let values = run("a{si}", Value::Table(table)).unwrap();
        assert_eq!(
            values,
            vec![WireValue::Array {
                element: Signature::array_element("{si}").unwrap(),
                items: vec![WireValue::DictEntry(
                    Box::new(WireValue::String("k".into())),
                    Box::new(WireValue::Int32(1)),
                )],
            }]
        );
    }

    #[test]
    fn test_dict_value_error_propagates() {
        let table = Table::from_pairs([("k", "x")]);
        let err = run("a{si}", Value::Table(table)).unwrap_err();
        assert_eq!(err.to_string(), "(number expected, got string)");
    }

    #[test]
    fn test_struct_missing_field_is_nil() {
        let err = run("(is)", Value::from(vec![Value::Integer(42)])).unwrap_err();
        assert_eq!(err.to_string(), "(string expected, got nil)");
    }

    #[test]
    fn test_struct_extra_fields_ignored() {
        let values = run(
            "(is)",
            Value::from(vec![
                Value::Integer(42),
                Value::from("x"),
                Value::from("extra"),
            ]),
        )
        .unwrap();
        assert_eq!(
            values,
            vec![WireValue::Struct(vec![
                WireValue::Int32(42),
                WireValue::String("x".into())
            ])]
        );
    }

    #[test]
    fn test_variant() {
        let values = run("v", Value::variant("i", 5)).unwrap();
        assert_eq!(
            values,
            vec![WireValue::Variant(Box::new(dbus_wire::Variant {
                signature: Signature::new("i").unwrap(),
                value: WireValue::Int32(5),
            }))]
        );
    }

    #[test]
    fn test_variant_signature_must_be_single() {
        for sig in ["ii", "", "a{"] {
            let err = run("v", Value::variant(sig, 5)).unwrap_err();
            assert_eq!(err.to_string(), "(invalid variant signature)", "{sig:?}");
        }
        let err = run("v", Value::Table(Table::new())).unwrap_err();
        assert_eq!(err.to_string(), "(invalid variant signature)");
    }

    #[test]
    fn test_variant_payload_mismatch() {
        let err = run("v", Value::variant("s", Value::Nil)).unwrap_err();
        assert_eq!(err.to_string(), "(string expected, got nil)");
    }
}
