//! End-to-end tests for introspection parsing.

use pretty_assertions::assert_eq;
use simple_dbus::{encode, parse_introspection, Access, ErrorKind, Table, Value};

const NOTIFICATIONS: &str = r#"<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN"
                      "http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd">
<!-- GDBus 2.76.1 -->
<node>
  <interface name="org.freedesktop.DBus.Properties">
    <method name="Get">
      <arg type="s" name="interface_name" direction="in"/>
      <arg type="s" name="property_name" direction="in"/>
      <arg type="v" name="value" direction="out"/>
    </method>
    <signal name="PropertiesChanged">
      <arg type="s" name="interface_name"/>
      <arg type="a{sv}" name="changed_properties"/>
      <arg type="as" name="invalidated_properties"/>
    </signal>
  </interface>
  <interface name="org.freedesktop.Notifications">
    <method name="Notify">
      <arg type="s" name="app_name" direction="in"/>
      <arg type="u" name="replaces_id" direction="in"/>
      <arg type="s" name="app_icon" direction="in"/>
      <arg type="s" name="summary" direction="in"/>
      <arg type="s" name="body" direction="in"/>
      <arg type="as" name="actions" direction="in"/>
      <arg type="a{sv}" name="hints" direction="in"/>
      <arg type="i" name="expire_timeout" direction="in"/>
      <arg type="u" name="id" direction="out"/>
    </method>
    <method name="CloseNotification">
      <arg type="u" name="id" direction="in"/>
    </method>
    <signal name="NotificationClosed">
      <arg type="u" name="id"/>
      <arg type="u" name="reason"/>
    </signal>
    <property type="s" name="Version" access="read">
      <annotation name="org.freedesktop.DBus.Property.EmitsChangedSignal" value="const"/>
    </property>
  </interface>
  <node name="child"/>
</node>
"#;

const PATH: &str = "/org/freedesktop/Notifications";

#[test]
fn test_parse_real_document() {
    let description = parse_introspection(NOTIFICATIONS, PATH).unwrap();
    assert_eq!(
        description.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
        vec!["org.freedesktop.DBus.Properties", "org.freedesktop.Notifications"]
    );

    let get = description
        .method("org.freedesktop.DBus.Properties", "Get")
        .unwrap();
    assert_eq!(get.signature, "ss");
    assert_eq!(get.result(), Some("v"));

    let changed = description
        .signal("org.freedesktop.DBus.Properties", "PropertiesChanged")
        .unwrap();
    assert_eq!(changed.signature, "sa{sv}as");
    assert_eq!(changed.object(), Some(PATH));
    assert_eq!(changed.interface, "org.freedesktop.DBus.Properties");

    let notify = description
        .method("org.freedesktop.Notifications", "Notify")
        .unwrap();
    assert_eq!(notify.signature, "susssasa{sv}i");
    assert_eq!(notify.result(), Some("u"));

    let version = description
        .property("org.freedesktop.Notifications", "Version")
        .unwrap();
    assert_eq!(version.type_signature, "s");
    assert_eq!(version.access, Access::Read);
}

#[test]
fn test_parsed_signature_drives_encoding() {
    let description = parse_introspection(NOTIFICATIONS, PATH).unwrap();
    let notify = description
        .method("org.freedesktop.Notifications", "Notify")
        .unwrap();

    let args = [
        Value::from("app"),
        Value::Integer(0),
        Value::from(""),
        Value::from("Hello"),
        Value::from("World"),
        Value::Table(Table::new()),
        Value::Table(Table::new()),
        Value::Integer(-1),
    ];
    let message = encode(&notify.signature, &args).unwrap();
    assert_eq!(message.values().len(), 8);

    let err = encode(&notify.signature, &args[..3]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "type error adding value #4 of 'susssasa{sv}i' (too few arguments)"
    );
}

#[test]
fn test_duplicate_method_keeps_first() {
    let xml = r#"<node><interface name="a.B">
        <method name="Foo"><arg type="s" direction="in"/></method>
        <method name="Foo"><arg type="i" direction="in"/></method>
    </interface></node>"#;
    let description = parse_introspection(xml, "/").unwrap();
    let iface = description.interface("a.B").unwrap();
    assert_eq!(iface.members.len(), 1);
    assert_eq!(description.method("a.B", "Foo").unwrap().signature, "s");
}

#[test]
fn test_in_and_out_arguments() {
    let xml = r#"<node><interface name="a.B">
        <method name="M">
            <arg type="s" direction="in"/>
            <arg type="i" direction="out"/>
        </method>
    </interface></node>"#;
    let description = parse_introspection(xml, "/").unwrap();
    let m = description.method("a.B", "M").unwrap();
    assert_eq!(m.signature, "s");
    assert_eq!(m.result(), Some("i"));
}

#[test]
fn test_property_without_access_is_ignored() {
    let xml = r#"<node><interface name="a.B">
        <property name="P" type="s"/>
        <property name="Q" type="u" access="write"/>
    </interface></node>"#;
    let description = parse_introspection(xml, "/").unwrap();
    assert!(description.property("a.B", "P").is_none());
    assert_eq!(
        description.property("a.B", "Q").unwrap().access,
        Access::Write
    );
}

#[test]
fn test_malformed_xml_yields_no_table() {
    let truncated = &NOTIFICATIONS[..NOTIFICATIONS.len() / 2];
    let err = parse_introspection(truncated, PATH).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Document);
    assert_eq!(err.to_string(), "Error parsing introspection data");
}

#[test]
fn test_members_and_properties_have_separate_namespaces() {
    let xml = r#"<node><interface name="a.B">
        <method name="Name"/>
        <property name="Name" type="s" access="read"/>
    </interface></node>"#;
    let description = parse_introspection(xml, "/").unwrap();
    assert!(description.method("a.B", "Name").is_some());
    assert!(description.property("a.B", "Name").is_some());
}

#[test]
fn test_duplicate_property_keeps_first() {
    let xml = r#"<node><interface name="a.B">
        <property name="P" type="s" access="read"/>
        <property name="P" type="u" access="readwrite"/>
    </interface></node>"#;
    let description = parse_introspection(xml, "/").unwrap();
    let iface = description.interface("a.B").unwrap();
    assert_eq!(iface.properties.len(), 1);
    let property = description.property("a.B", "P").unwrap();
    assert_eq!(property.type_signature, "s");
    assert_eq!(property.access, Access::Read);
}
