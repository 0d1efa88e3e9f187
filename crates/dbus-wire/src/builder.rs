//! Scoped, append-only argument builder.
//!
//! The builder mirrors how a message body is assembled: basic values are
//! appended to the current scope, containers are opened, filled, and closed
//! into a single value in their parent scope. A scope can also be abandoned,
//! which drops it and everything appended to it without touching the parent.
//!
//! ```rust
//! use dbus_wire::{ArgumentBuilder, ContainerKind, Signature, WireValue};
//!
//! let mut builder = ArgumentBuilder::new();
//! builder.open(ContainerKind::Array(Signature::array_element("i").unwrap())).unwrap();
//! builder.append(WireValue::Int32(1)).unwrap();
//! builder.append(WireValue::Int32(2)).unwrap();
//! builder.close().unwrap();
//! let values = builder.finish().unwrap();
//! assert_eq!(values[0].signature(), "ai");
//! ```

use crate::error::{Result, WireError};
use crate::marshal::MAX_DEPTH;
use crate::signature::Signature;
use crate::value::{Variant, WireValue};

/// The kind of container a scope builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerKind {
    /// An array whose items all have the given element signature.
    Array(Signature),
    Struct,
    /// A key/value pair; only valid directly inside an array scope.
    DictEntry,
    /// A variant holding exactly one value of the given signature.
    Variant(Signature),
}

#[derive(Debug)]
struct Scope {
    kind: ContainerKind,
    items: Vec<WireValue>,
}

/// Builds the top-level values of one message body.
#[derive(Debug, Default)]
pub struct ArgumentBuilder {
    root: Vec<WireValue>,
    scopes: Vec<Scope>,
}

impl ArgumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Values already committed at the top level.
    pub fn values(&self) -> &[WireValue] {
        &self.root
    }

    /// Append a complete value to the current scope.
    pub fn append(&mut self, value: WireValue) -> Result<()> {
        let Some(scope) = self.scopes.last_mut() else {
            if matches!(value, WireValue::DictEntry(..)) {
                return Err(WireError::Builder(
                    "dict entry outside of an array".into(),
                ));
            }
            self.root.push(value);
            return Ok(());
        };

        match &scope.kind {
            ContainerKind::Array(element) => {
                let actual = value.signature();
                if actual != element.as_str() {
                    return Err(WireError::Mismatch {
                        expected: element.to_string(),
                        actual,
                    });
                }
            }
            ContainerKind::Struct => {
                if matches!(value, WireValue::DictEntry(..)) {
                    return Err(WireError::Builder(
                        "dict entry outside of an array".into(),
                    ));
                }
            }
            ContainerKind::DictEntry => match scope.items.len() {
                0 if !value.type_code().is_basic() => {
                    return Err(WireError::Builder(format!(
                        "dict entry key must be a basic type, got {}",
                        value.type_code()
                    )));
                }
                0 | 1 => {}
                _ => {
                    return Err(WireError::Builder(
                        "dict entry already holds a key and a value".into(),
                    ))
                }
            },
            ContainerKind::Variant(_) => {
                if !scope.items.is_empty() {
                    return Err(WireError::Builder(
                        "variant already holds a value".into(),
                    ));
                }
            }
        }
        scope.items.push(value);
        Ok(())
    }

    /// Open a new container scope inside the current one.
    pub fn open(&mut self, kind: ContainerKind) -> Result<()> {
        if kind == ContainerKind::DictEntry
            && !matches!(
                self.scopes.last().map(|s| &s.kind),
                Some(ContainerKind::Array(_))
            )
        {
            return Err(WireError::Builder(
                "dict entry outside of an array".into(),
            ));
        }
        if self.scopes.len() >= MAX_DEPTH {
            return Err(WireError::Builder(format!(
                "container nesting exceeds {MAX_DEPTH} levels"
            )));
        }
        self.scopes.push(Scope {
            kind,
            items: Vec::new(),
        });
        Ok(())
    }

    /// Close the innermost scope, appending the finished container to its
    /// parent.
    pub fn close(&mut self) -> Result<()> {
        let scope = self
            .scopes
            .pop()
            .ok_or_else(|| WireError::Builder("close without an open container".into()))?;

        let value = match scope.kind {
            ContainerKind::Array(element) => WireValue::Array {
                element,
                items: scope.items,
            },
            ContainerKind::Struct => {
                if scope.items.is_empty() {
                    return Err(WireError::Builder("struct has no members".into()));
                }
                WireValue::Struct(scope.items)
            }
            ContainerKind::DictEntry => {
                let mut items = scope.items.into_iter();
                match (items.next(), items.next()) {
                    (Some(key), Some(value)) => {
                        WireValue::DictEntry(Box::new(key), Box::new(value))
                    }
                    _ => {
                        return Err(WireError::Builder(
                            "dict entry must have a key and a value".into(),
                        ))
                    }
                }
            }
            ContainerKind::Variant(signature) => {
                let value = scope
                    .items
                    .into_iter()
                    .next()
                    .ok_or_else(|| WireError::Builder("variant holds no value".into()))?;
                let actual = value.signature();
                if actual != signature.as_str() {
                    return Err(WireError::Mismatch {
                        expected: signature.to_string(),
                        actual,
                    });
                }
                WireValue::Variant(Box::new(Variant { signature, value }))
            }
        };
        self.append(value)
    }

    /// Drop the innermost scope and everything appended to it.
    pub fn abandon(&mut self) -> Result<()> {
        self.scopes
            .pop()
            .map(|_| ())
            .ok_or_else(|| WireError::Builder("abandon without an open container".into()))
    }

    /// Open a scope, run `fill`, then close it on success or abandon it
    /// (along with anything `fill` left open) on failure.
    pub fn scoped<E, F>(&mut self, kind: ContainerKind, fill: F) -> std::result::Result<(), E>
    where
        E: From<WireError>,
        F: FnOnce(&mut Self) -> std::result::Result<(), E>,
    {
        let depth = self.scopes.len();
        self.open(kind)?;
        match fill(self) {
            Ok(()) => {
                if self.scopes.len() != depth + 1 {
                    self.scopes.truncate(depth);
                    return Err(WireError::Builder("unbalanced container scopes".into()).into());
                }
                if let Err(e) = self.close() {
                    self.scopes.truncate(depth);
                    return Err(e.into());
                }
                Ok(())
            }
            Err(e) => {
                self.scopes.truncate(depth);
                Err(e)
            }
        }
    }

    /// Finish building, returning the top-level values.
    pub fn finish(self) -> Result<Vec<WireValue>> {
        if !self.scopes.is_empty() {
            return Err(WireError::Builder(format!(
                "{} container(s) left open",
                self.scopes.len()
            )));
        }
        Ok(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array_of(element: &str) -> ContainerKind {
        ContainerKind::Array(Signature::array_element(element).unwrap())
    }

    #[test]
    fn test_basic_values_go_to_root() {
        let mut builder = ArgumentBuilder::new();
        builder.append(WireValue::Int32(1)).unwrap();
        builder.append(WireValue::String("x".into())).unwrap();
        assert_eq!(
            builder.finish().unwrap(),
            vec![WireValue::Int32(1), WireValue::String("x".into())]
        );
    }

    #[test]
    fn test_dict_array() {
        let mut builder = ArgumentBuilder::new();
        builder.open(array_of("{si}")).unwrap();
        builder.open(ContainerKind::DictEntry).unwrap();
        builder.append(WireValue::String("a".into())).unwrap();
        builder.append(WireValue::Int32(1)).unwrap();
        builder.close().unwrap();
        builder.close().unwrap();

        let values = builder.finish().unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].signature(), "a{si}");
        assert!(values[0].is_dict());
    }

    #[test]
    fn test_array_rejects_wrong_item_type() {
        let mut builder = ArgumentBuilder::new();
        builder.open(array_of("i")).unwrap();
        let err = builder.append(WireValue::String("x".into())).unwrap_err();
        assert!(matches!(err, WireError::Mismatch { .. }));
    }

    #[test]
    fn test_dict_entry_requires_array_parent() {
        let mut builder = ArgumentBuilder::new();
        assert!(builder.open(ContainerKind::DictEntry).is_err());
        builder.open(ContainerKind::Struct).unwrap();
        assert!(builder.open(ContainerKind::DictEntry).is_err());
    }

    #[test]
    fn test_variant_checks_signature() {
        let mut builder = ArgumentBuilder::new();
        builder
            .open(ContainerKind::Variant(Signature::single("i").unwrap()))
            .unwrap();
        builder.append(WireValue::String("no".into())).unwrap();
        assert!(builder.close().is_err());
    }

    #[test]
    fn test_abandon_leaves_parent_untouched() {
        let mut builder = ArgumentBuilder::new();
        builder.open(ContainerKind::Struct).unwrap();
        builder.append(WireValue::Int32(1)).unwrap();
        builder.open(array_of("s")).unwrap();
        builder.append(WireValue::String("dropped".into())).unwrap();
        builder.abandon().unwrap();
        builder.close().unwrap();

        assert_eq!(
            builder.finish().unwrap(),
            vec![WireValue::Struct(vec![WireValue::Int32(1)])]
        );
    }

    #[test]
    fn test_scoped_abandons_on_error() {
        let mut builder = ArgumentBuilder::new();
        let result: std::result::Result<(), WireError> =
            builder.scoped(ContainerKind::Struct, |b| {
                b.append(WireValue::Int32(1))?;
                b.open(ContainerKind::Struct)?;
                Err(WireError::Builder("boom".into()))
            });
        assert!(result.is_err());
        assert_eq!(builder.depth(), 0);
        assert!(builder.finish().unwrap().is_empty());
    }

    #[test]
    fn test_finish_with_open_scope_fails() {
        let mut builder = ArgumentBuilder::new();
        builder.open(ContainerKind::Struct).unwrap();
        assert!(builder.finish().is_err());
    }

    #[test]
    fn test_nesting_limit_matches_reader() {
        let mut builder = ArgumentBuilder::new();
        for _ in 0..MAX_DEPTH {
            builder.open(ContainerKind::Struct).unwrap();
        }
        assert!(builder.open(ContainerKind::Struct).is_err());
        assert_eq!(builder.depth(), MAX_DEPTH);
    }

    #[test]
    fn test_close_without_open_fails() {
        let mut builder = ArgumentBuilder::new();
        assert!(builder.close().is_err());
        assert!(builder.abandon().is_err());
    }
}
