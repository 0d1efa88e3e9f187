//! Parsed introspection data.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Everything an object exposes, keyed by interface name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Introspection {
    pub interfaces: BTreeMap<String, Interface>,
}

impl Introspection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.get(name)
    }

    /// Look up a method by interface and member name.
    pub fn method(&self, interface: &str, name: &str) -> Option<&Member> {
        self.interface(interface)?
            .members
            .get(name)
            .filter(|m| m.is_method())
    }

    /// Look up a signal by interface and member name.
    pub fn signal(&self, interface: &str, name: &str) -> Option<&Member> {
        self.interface(interface)?
            .members
            .get(name)
            .filter(|m| !m.is_method())
    }

    pub fn property(&self, interface: &str, name: &str) -> Option<&Property> {
        self.interface(interface)?.properties.get(name)
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Iterate interfaces in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.values()
    }
}

/// One interface: its methods and signals (sharing one namespace) and its
/// properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Interface {
    pub name: String,
    pub members: BTreeMap<String, Member>,
    pub properties: BTreeMap<String, Property>,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn methods(&self) -> impl Iterator<Item = &Member> {
        self.members.values().filter(|m| m.is_method())
    }

    pub fn signals(&self) -> impl Iterator<Item = &Member> {
        self.members.values().filter(|m| !m.is_method())
    }
}

/// A method or signal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Member {
    pub name: String,
    /// Name of the interface declaring this member
    pub interface: String,
    /// Concatenated types of the input arguments
    pub signature: String,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: MemberKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "kind", rename_all = "lowercase")
)]
pub enum MemberKind {
    /// `result` holds the concatenated types of the output arguments.
    Method { result: String },
    /// `object` is the path of the object that was introspected.
    Signal { object: String },
}

impl Member {
    pub fn is_method(&self) -> bool {
        matches!(self.kind, MemberKind::Method { .. })
    }

    /// Output signature of a method.
    pub fn result(&self) -> Option<&str> {
        match &self.kind {
            MemberKind::Method { result } => Some(result),
            MemberKind::Signal { .. } => None,
        }
    }

    /// Emitting object path of a signal.
    pub fn object(&self) -> Option<&str> {
        match &self.kind {
            MemberKind::Signal { object } => Some(object),
            MemberKind::Method { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Property {
    pub name: String,
    /// The property's type signature
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub type_signature: String,
    pub access: Access,
}

/// Access mode of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "lowercase")
)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Write => "write",
            Access::ReadWrite => "readwrite",
        }
    }

    pub fn is_readable(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

impl FromStr for Access {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Access::Read),
            "write" => Ok(Access::Write),
            "readwrite" => Ok(Access::ReadWrite),
            other => Err(format!("unknown property access '{other}'")),
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
