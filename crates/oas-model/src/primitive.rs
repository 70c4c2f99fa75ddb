//! Primitive kinds and the kind-to-descriptor fragment table

use crate::{Error, Result};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// The closed set of primitive field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Whole numbers
    Integer,
    /// Floating-point numbers
    Number,
    /// Text
    String,
    /// True/false
    Boolean,
}

impl Primitive {
    /// Parse a primitive kind from its document name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "integer" => Ok(Self::Integer),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "boolean" => Ok(Self::Boolean),
            other => Err(Error::UnknownPrimitiveName(other.to_string())),
        }
    }

    /// The document name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed mapping from primitive kinds to immutable schema-descriptor
/// fragments.
///
/// Write-once-then-read-many: fragments are registered during setup and
/// resolved any number of times afterwards. A fragment is the complete
/// descriptor emitted for a field of that kind, e.g.
/// `{"type": "integer"}`, so custom registrations may carry extra keys
/// such as `format`.
#[derive(Debug, Clone, Default)]
pub struct TypeGuesser {
    mapping: HashMap<Primitive, Value>,
}

impl TypeGuesser {
    /// Create an empty table with no registered kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table seeded with the built-in primitive fragments.
    pub fn with_builtins() -> Self {
        let mut guesser = Self::new();
        guesser.register(Primitive::Integer, json!({"type": "integer"}));
        guesser.register(Primitive::Number, json!({"type": "number"}));
        guesser.register(Primitive::String, json!({"type": "string"}));
        guesser.register(Primitive::Boolean, json!({"type": "boolean"}));
        guesser
    }

    /// Install or overwrite the fragment for a kind.
    pub fn register(&mut self, kind: Primitive, fragment: Value) {
        trace!("registering fragment for primitive kind: {}", kind);
        self.mapping.insert(kind, fragment);
    }

    /// Resolve the fragment for a kind.
    pub fn resolve(&self, kind: Primitive) -> Result<&Value> {
        self.mapping
            .get(&kind)
            .ok_or(Error::UnsupportedKind(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_fragments() {
        let guesser = TypeGuesser::with_builtins();
        assert_eq!(
            guesser.resolve(Primitive::Integer).unwrap(),
            &json!({"type": "integer"})
        );
        assert_eq!(
            guesser.resolve(Primitive::Boolean).unwrap(),
            &json!({"type": "boolean"})
        );
    }

    #[test]
    fn test_empty_table_is_unsupported() {
        let guesser = TypeGuesser::new();
        match guesser.resolve(Primitive::String) {
            Err(Error::UnsupportedKind(Primitive::String)) => (),
            other => panic!("expected UnsupportedKind, got {other:?}"),
        }
    }

    #[test]
    fn test_register_overwrites() {
        let mut guesser = TypeGuesser::with_builtins();
        guesser.register(
            Primitive::String,
            json!({"type": "string", "format": "date-time"}),
        );
        assert_eq!(
            guesser.resolve(Primitive::String).unwrap(),
            &json!({"type": "string", "format": "date-time"})
        );
    }

    #[test]
    fn test_name_round_trip() {
        for kind in [
            Primitive::Integer,
            Primitive::Number,
            Primitive::String,
            Primitive::Boolean,
        ] {
            assert_eq!(Primitive::from_name(kind.name()).unwrap(), kind);
        }
        assert!(Primitive::from_name("datetime").is_err());
    }
}
