//! Cached path-based cross-references

use serde_json::{Value, json};

/// A cross-reference binding a schema entity to the chain of enclosing
/// namespaces observed the first time it was resolved as a nested target.
///
/// Immutable once constructed, except for the lazily computed full path,
/// which is cached in a nullable slot on first access so repeated
/// embedding always renders the identical reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XRef {
    segments: Vec<String>,
    owner: String,
    cached_path: Option<String>,
}

impl XRef {
    /// Bind an owner entity name to its captured namespace chain.
    pub fn new(segments: Vec<String>, owner: impl Into<String>) -> Self {
        Self {
            segments,
            owner: owner.into(),
            cached_path: None,
        }
    }

    /// The reference path: `#/` followed by the namespace chain and the
    /// owner name. Computed once, then served from the cache slot.
    pub fn full_path(&mut self) -> &str {
        let segments = &self.segments;
        let owner = &self.owner;
        self.cached_path.get_or_insert_with(|| {
            let mut parts: Vec<&str> = segments.iter().map(String::as_str).collect();
            parts.push(owner);
            format!("#/{}", parts.join("/"))
        })
    }

    /// The serialized form: `{"$ref": fullpath}`.
    pub fn as_value(&mut self) -> Value {
        json!({"$ref": self.full_path()})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_path_joins_chain_and_owner() {
        let mut xref = XRef::new(
            vec!["components".to_string(), "schemas".to_string()],
            "Person",
        );
        assert_eq!(xref.full_path(), "#/components/schemas/Person");
        assert_eq!(
            xref.as_value(),
            json!({"$ref": "#/components/schemas/Person"})
        );
    }

    #[test]
    fn test_empty_chain_still_prefixes() {
        let mut xref = XRef::new(Vec::new(), "Person");
        assert_eq!(xref.full_path(), "#/Person");
    }

    #[test]
    fn test_path_is_cached() {
        let mut xref = XRef::new(vec!["a".to_string()], "B");
        let first = xref.full_path().to_string();
        let second = xref.full_path().to_string();
        assert_eq!(first, second);
    }
}
