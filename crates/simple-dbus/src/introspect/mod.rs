//! Introspection XML parsing.
//!
//! Only the shape the bus actually produces is understood:
//!
//! ```text
//! <node>
//!   <interface name="...">
//!     <method name="...">  <arg type="..." direction="in|out"/> </method>
//!     <signal name="...">  <arg type="..."/> </signal>
//!     <property name="..." type="..." access="read|write|readwrite"/>
//!   </interface>
//! </node>
//! ```
//!
//! Anything else (child nodes, annotations, unknown elements) is skipped
//! together with its subtree. Incomplete declarations are dropped silently;
//! only a malformed document is an error.

mod model;

pub use model::{Access, Interface, Introspection, Member, MemberKind, Property};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, IntrospectError, Result};

/// Parse an introspection document describing the object at `object_path`.
pub fn parse_introspection(xml: &str, object_path: &str) -> Result<Introspection> {
    parse_document(xml, object_path).map_err(|e| {
        tracing::debug!("rejecting introspection data for {object_path}: {e}");
        Error::Introspection(e)
    })
}

fn parse_document(
    xml: &str,
    object_path: &str,
) -> std::result::Result<Introspection, IntrospectError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut parser = Parser::new(object_path);
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let position = reader.buffer_position();
        let malformed = |reason: &str| IntrospectError::Malformed {
            position,
            reason: reason.to_string(),
        };

        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if depth == 0 && std::mem::replace(&mut seen_root, true) {
                    return Err(malformed("content after the root element"));
                }
                let (name, attrs) = element(&e, position)?;
                parser.open(&name, &attrs);
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                if depth == 0 && std::mem::replace(&mut seen_root, true) {
                    return Err(malformed("content after the root element"));
                }
                let (name, attrs) = element(&e, position)?;
                parser.open(&name, &attrs);
                parser.close();
            }
            Ok(Event::End(_)) => {
                if depth == 0 {
                    return Err(malformed("closing tag without an open element"));
                }
                depth -= 1;
                parser.close();
            }
            Ok(Event::Text(_)) | Ok(Event::CData(_)) if depth == 0 => {
                return Err(malformed("text outside the root element"));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(source) => {
                return Err(IntrospectError::Xml {
                    position: reader.buffer_position(),
                    source,
                })
            }
        }
    }

    if depth != 0 {
        return Err(IntrospectError::Malformed {
            position: reader.buffer_position(),
            reason: format!("{depth} element(s) left open"),
        });
    }
    if !seen_root {
        return Err(IntrospectError::Malformed {
            position: 0,
            reason: "no root element".into(),
        });
    }

    Ok(parser.finish())
}

type Attributes = Vec<(String, String)>;

/// Element name and all attributes, unescaped.
fn element(
    e: &BytesStart<'_>,
    position: usize,
) -> std::result::Result<(String, Attributes), IntrospectError> {
    let xml_error = |source: quick_xml::Error| IntrospectError::Xml { position, source };

    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| xml_error(quick_xml::Error::from(err)))?
        .to_string();

    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_error(quick_xml::Error::from(err)))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| xml_error(quick_xml::Error::from(err)))?
            .to_string();
        let value = attr.unescape_value().map_err(xml_error)?.into_owned();
        attrs.push((key, value));
    }
    Ok((name, attrs))
}

fn attribute<'a>(attrs: &'a Attributes, name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

// ============================================================================
// State machine
// ============================================================================

/// What the element on top of the stack is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Root,
    Interface,
    Member,
    Property,
    Arg,
    /// Ignored element; everything below it is ignored too
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Method,
    Signal,
}

#[derive(Debug)]
struct PendingMember {
    name: String,
    kind: PendingKind,
    signature: String,
    result: String,
}

struct Parser<'a> {
    object_path: &'a str,
    stack: Vec<Frame>,
    description: Introspection,
    interface: Option<Interface>,
    member: Option<PendingMember>,
    property: Option<Property>,
}

impl<'a> Parser<'a> {
    fn new(object_path: &'a str) -> Self {
        Self {
            object_path,
            stack: Vec::new(),
            description: Introspection::new(),
            interface: None,
            member: None,
            property: None,
        }
    }

    fn open(&mut self, name: &str, attrs: &Attributes) {
        let top = self.stack.last().copied();
        let frame = match (top, name) {
            (None, _) => Frame::Root,
            (Some(Frame::Root), "interface") => self.begin_interface(attrs),
            (Some(Frame::Interface), "method") => self.begin_member(PendingKind::Method, attrs),
            (Some(Frame::Interface), "signal") => self.begin_member(PendingKind::Signal, attrs),
            (Some(Frame::Interface), "property") => self.begin_property(attrs),
            (Some(Frame::Member), "arg") => {
                self.add_arg(attrs);
                Frame::Arg
            }
            _ => Frame::Skipped,
        };
        if frame == Frame::Skipped {
            tracing::trace!(element = name, depth = self.stack.len(), "skipping element");
        }
        self.stack.push(frame);
    }

    fn close(&mut self) {
        match self.stack.pop() {
            Some(Frame::Interface) => self.end_interface(),
            Some(Frame::Member) => self.end_member(),
            Some(Frame::Property) => self.end_property(),
            _ => {}
        }
    }

    fn finish(self) -> Introspection {
        self.description
    }

    fn begin_interface(&mut self, attrs: &Attributes) -> Frame {
        let Some(name) = attribute(attrs, "name") else {
            tracing::debug!("interface without a name");
            return Frame::Skipped;
        };
        self.interface = Some(Interface::new(name));
        Frame::Interface
    }

    fn end_interface(&mut self) {
        if let Some(interface) = self.interface.take() {
            if self.description.interfaces.contains_key(&interface.name) {
                tracing::debug!(interface = %interface.name, "replacing duplicate interface");
            }
            self.description
                .interfaces
                .insert(interface.name.clone(), interface);
        }
    }

    fn begin_member(&mut self, kind: PendingKind, attrs: &Attributes) -> Frame {
        let Some(interface) = self.interface.as_ref() else {
            return Frame::Skipped;
        };
        let Some(name) = attribute(attrs, "name") else {
            tracing::debug!(interface = %interface.name, "member without a name");
            return Frame::Skipped;
        };
        if interface.members.contains_key(name) {
            tracing::debug!(interface = %interface.name, member = name, "ignoring duplicate member");
            return Frame::Skipped;
        }
        self.member = Some(PendingMember {
            name: name.to_string(),
            kind,
            signature: String::new(),
            result: String::new(),
        });
        Frame::Member
    }

    fn add_arg(&mut self, attrs: &Attributes) {
        let Some(member) = self.member.as_mut() else {
            return;
        };
        let Some(ty) = attribute(attrs, "type") else {
            return;
        };
        match attribute(attrs, "direction") {
            Some(direction) if direction != "in" => member.result.push_str(ty),
            _ => member.signature.push_str(ty),
        }
    }

    fn end_member(&mut self) {
        let (Some(interface), Some(member)) = (self.interface.as_mut(), self.member.take()) else {
            return;
        };
        let kind = match member.kind {
            PendingKind::Method => MemberKind::Method {
                result: member.result,
            },
            PendingKind::Signal => MemberKind::Signal {
                object: self.object_path.to_string(),
            },
        };
        interface
            .members
            .entry(member.name.clone())
            .or_insert(Member {
                name: member.name,
                interface: interface.name.clone(),
                signature: member.signature,
                kind,
            });
    }

    fn begin_property(&mut self, attrs: &Attributes) -> Frame {
        let Some(interface) = self.interface.as_ref() else {
            return Frame::Skipped;
        };
        let (Some(name), Some(ty), Some(access)) = (
            attribute(attrs, "name"),
            attribute(attrs, "type"),
            attribute(attrs, "access"),
        ) else {
            tracing::debug!(interface = %interface.name, "incomplete property declaration");
            return Frame::Skipped;
        };
        if interface.properties.contains_key(name) {
            return Frame::Skipped;
        }
        let access = match access.parse::<Access>() {
            Ok(access) => access,
            Err(reason) => {
                tracing::debug!(interface = %interface.name, property = name, "{reason}");
                return Frame::Skipped;
            }
        };
        self.property = Some(Property {
            name: name.to_string(),
            type_signature: ty.to_string(),
            access,
        });
        Frame::Property
    }

    fn end_property(&mut self) {
        let (Some(interface), Some(property)) = (self.interface.as_mut(), self.property.take())
        else {
            return;
        };
        interface
            .properties
            .entry(property.name.clone())
            .or_insert(property);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const PLAYER: &str = r#"<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN"
 "http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd">
<node>
  <interface name="org.example.Player">
    <method name="Play">
      <arg name="uri" type="s" direction="in"/>
      <arg name="position" type="x"/>
      <arg name="ok" type="b" direction="out"/>
    </method>
    <signal name="Seeked">
      <arg name="position" type="x"/>
    </signal>
    <property name="Volume" type="d" access="readwrite"/>
    <annotation name="org.freedesktop.DBus.Deprecated" value="false"/>
  </interface>
  <node name="child"/>
</node>
"#;

    #[test]
    fn test_parse_player() {
        let description = parse_introspection(PLAYER, "/org/example/player").unwrap();
        assert_eq!(description.len(), 1);

        let play = description.method("org.example.Player", "Play").unwrap();
        assert_eq!(play.signature, "sx");
        assert_eq!(play.result(), Some("b"));
        assert_eq!(play.interface, "org.example.Player");

        let seeked = description.signal("org.example.Player", "Seeked").unwrap();
        assert_eq!(seeked.signature, "x");
        assert_eq!(seeked.object(), Some("/org/example/player"));

        let volume = description.property("org.example.Player", "Volume").unwrap();
        assert_eq!(volume.type_signature, "d");
        assert_eq!(volume.access, Access::ReadWrite);
    }

    #[test]
    fn test_method_without_args() {
        let xml = r#"<node><interface name="a.B"><method name="Ping"/></interface></node>"#;
        let description = parse_introspection(xml, "/").unwrap();
        let ping = description.method("a.B", "Ping").unwrap();
        assert_eq!(ping.signature, "");
        assert_eq!(ping.result(), Some(""));
    }

    #[test]
    fn test_first_member_wins() {
        let xml = r#"<node><interface name="a.B">
            <method name="M"><arg type="i"/></method>
            <signal name="M"><arg type="s"/></signal>
        </interface></node>"#;
        let description = parse_introspection(xml, "/").unwrap();
        let m = description.method("a.B", "M").unwrap();
        assert_eq!(m.signature, "i");
        assert!(description.signal("a.B", "M").is_none());
    }

    #[test]
    fn test_skipped_member_args_do_not_leak() {
        let xml = r#"<node><interface name="a.B">
            <method name="M"><arg type="i"/></method>
            <method name="M"><arg type="s"/></method>
            <method name="N"><arg type="y"/></method>
        </interface></node>"#;
        let description = parse_introspection(xml, "/").unwrap();
        assert_eq!(description.method("a.B", "N").unwrap().signature, "y");
    }

    #[test]
    fn test_arg_without_type_is_ignored() {
        let xml = r#"<node><interface name="a.B">
            <method name="M"><arg name="x"/><arg type="u"/></method>
        </interface></node>"#;
        let description = parse_introspection(xml, "/").unwrap();
        assert_eq!(description.method("a.B", "M").unwrap().signature, "u");
    }

    #[test]
    fn test_incomplete_declarations_are_dropped() {
        let xml = r#"<node>
            <interface>
                <method name="Lost"/>
            </interface>
            <interface name="a.B">
                <method/>
                <property name="P" type="s"/>
                <property name="Q" access="read"/>
                <property name="R" type="s" access="sometimes"/>
            </interface>
        </node>"#;
        let description = parse_introspection(xml, "/").unwrap();
        assert_eq!(description.len(), 1);
        let iface = description.interface("a.B").unwrap();
        assert!(iface.members.is_empty());
        assert!(iface.properties.is_empty());
    }

    #[test]
    fn test_nested_elements_are_skipped() {
        let xml = r#"<node><interface name="a.B">
            <method name="M">
                <annotation name="x"><arg type="s"/></annotation>
                <arg type="i"/>
            </method>
            <property name="P" type="s" access="read"><arg type="i"/></property>
        </interface></node>"#;
        let description = parse_introspection(xml, "/").unwrap();
        assert_eq!(description.method("a.B", "M").unwrap().signature, "i");
        assert!(description.property("a.B", "P").is_some());
    }

    #[test]
    fn test_interface_outside_root_child_is_skipped() {
        let xml = r#"<node><node name="c"><interface name="a.B"/></node></node>"#;
        let description = parse_introspection(xml, "/").unwrap();
        assert!(description.is_empty());
    }

    #[test]
    fn test_duplicate_interface_replaces() {
        let xml = r#"<node>
            <interface name="a.B"><method name="Old"/></interface>
            <interface name="a.B"><method name="New"/></interface>
        </node>"#;
        let description = parse_introspection(xml, "/").unwrap();
        let iface = description.interface("a.B").unwrap();
        assert!(iface.members.contains_key("New"));
        assert!(!iface.members.contains_key("Old"));
    }

    #[test]
    fn test_malformed_documents() {
        for xml in [
            "",
            "<node>",
            "<node><interface></node>",
            "<node/><node/>",
            "<node/>trailing",
            "</node>",
            "<node a=\"1\" a=\"2\"/>",
        ] {
            let err = parse_introspection(xml, "/").unwrap_err();
            assert_eq!(err.to_string(), "Error parsing introspection data", "{xml:?}");
            assert_eq!(err.kind(), ErrorKind::Document);
        }
    }

    #[test]
    fn test_entities_are_unescaped() {
        let xml = r#"<node><interface name="a.B"><method name="M"><arg type="a{s&#x76;}"/></method></interface></node>"#;
        let description = parse_introspection(xml, "/").unwrap();
        assert_eq!(description.method("a.B", "M").unwrap().signature, "a{sv}");
    }
}
