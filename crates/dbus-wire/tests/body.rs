//! Building and marshaling complete message bodies.

use dbus_wire::{
    marshal, ArgumentBuilder, ContainerKind, Signature, Variant, WireError, WireValue,
};
use pretty_assertions::assert_eq;

fn sig(s: &str) -> Signature {
    Signature::new(s).unwrap()
}

/// The body of `org.freedesktop.DBus.Properties.Set("a.B", "Volume", <0.5>)`.
fn properties_set() -> Vec<WireValue> {
    let mut builder = ArgumentBuilder::new();
    builder.append(WireValue::String("a.B".into())).unwrap();
    builder.append(WireValue::String("Volume".into())).unwrap();
    builder.open(ContainerKind::Variant(sig("d"))).unwrap();
    builder.append(WireValue::Double(0.5)).unwrap();
    builder.close().unwrap();
    builder.finish().unwrap()
}

#[test]
fn test_properties_set_layout() {
    let body = marshal::write_body(&properties_set());
    let mut expected = Vec::new();
    // "a.B": length, bytes, NUL
    expected.extend_from_slice(&[3, 0, 0, 0, b'a', b'.', b'B', 0]);
    // "Volume" starts aligned at 8
    expected.extend_from_slice(&[6, 0, 0, 0]);
    expected.extend_from_slice(b"Volume\0");
    // variant signature "d" at 19, then pad to 24 for the double
    expected.extend_from_slice(&[1, b'd', 0]);
    expected.extend_from_slice(&[0, 0]);
    expected.extend_from_slice(&0.5f64.to_le_bytes());
    assert_eq!(&body[..], &expected[..]);
}

#[test]
fn test_properties_set_roundtrip() {
    let values = properties_set();
    let body = marshal::write_body(&values).freeze();
    let read = marshal::read_body(&sig("ssv"), body).unwrap();
    assert_eq!(read, values);
    assert_eq!(
        read[2],
        WireValue::Variant(Box::new(Variant {
            signature: sig("d"),
            value: WireValue::Double(0.5),
        }))
    );
}

#[test]
fn test_array_of_structs_roundtrip() {
    let mut builder = ArgumentBuilder::new();
    builder
        .scoped::<WireError, _>(ContainerKind::Array(sig("(yx)")), |b| {
            for (tag, n) in [(1u8, -1i64), (2, i64::MAX)] {
                b.scoped::<WireError, _>(ContainerKind::Struct, |b| {
                    b.append(WireValue::Byte(tag))?;
                    b.append(WireValue::Int64(n))
                })?;
            }
            Ok(())
        })
        .unwrap();
    let values = builder.finish().unwrap();

    let body = marshal::write_body(&values);
    // length, pad to 8, then two 16-byte structs
    assert_eq!(&body[..4], &32u32.to_le_bytes());
    assert_eq!(body.len(), 8 + 32);

    let read = marshal::read_body(&sig("a(yx)"), body.freeze()).unwrap();
    assert_eq!(read, values);
}

#[test]
fn test_failed_scope_leaves_no_trace() {
    let mut builder = ArgumentBuilder::new();
    builder.append(WireValue::Int32(1)).unwrap();
    let result = builder.scoped(ContainerKind::Array(sig("i")), |b| {
        b.append(WireValue::Int32(2))?;
        b.append(WireValue::String("wrong".into()))
    });
    assert!(result.is_err());
    assert_eq!(builder.depth(), 0);
    assert_eq!(builder.finish().unwrap(), vec![WireValue::Int32(1)]);
}

#[test]
fn test_read_body_rejects_short_input() {
    let body = marshal::write_body(&[WireValue::Int64(7)]).freeze();
    let err = marshal::read_body(&sig("xx"), body).unwrap_err();
    assert!(matches!(err, WireError::Marshal(_)));
}
