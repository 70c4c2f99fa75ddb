//! Slash-path queries over a namespace tree

use crate::member::Member;
use crate::registry::{NamespaceId, SchemaRegistry};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Path-indexed query service over a namespace tree.
///
/// Queries like `schemas/Person` walk `children` by every segment but
/// the last, then linear-scan the final namespace's members by resolved
/// name. Outcomes are memoized by the parsed segment list, so repeated
/// lookups of the same path return without re-walking the tree.
#[derive(Debug, Default)]
pub struct Lookup {
    cache: HashMap<Vec<String>, Member>,
    walks: usize,
}

impl Lookup {
    /// An empty lookup with a cold cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a slash path under `root`. Leading and trailing slashes
    /// are ignored. Misses — an absent intermediate namespace segment or
    /// an unmatched final member name — are a reported `None`, not an
    /// error.
    pub fn lookup(
        &mut self,
        registry: &SchemaRegistry,
        root: NamespaceId,
        query: &str,
    ) -> Option<Member> {
        let trimmed = query.trim_matches('/');
        if trimmed.is_empty() {
            return None;
        }
        let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();

        if let Some(member) = self.cache.get(&segments) {
            trace!("lookup cache hit: {}", trimmed);
            return Some(member.clone());
        }

        self.walks += 1;
        let mut ns = root;
        for segment in &segments[..segments.len() - 1] {
            match registry.child(ns, segment) {
                Some(child) => ns = child,
                None => {
                    debug!("namespace segment not found: {}", segment);
                    return None;
                }
            }
        }

        let last = &segments[segments.len() - 1];
        for member in registry.members(ns) {
            if registry.member_name(member) == last {
                let found = member.clone();
                self.cache.insert(segments, found.clone());
                return Some(found);
            }
        }
        debug!("no member named '{}' under '{}'", last, trimmed);
        None
    }

    /// Number of cache-missed tree walks performed so far. For
    /// diagnostics and tests.
    pub fn walk_count(&self) -> usize {
        self.walks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oas_model::{FieldType, ObjectDecl, Primitive};

    fn build() -> (SchemaRegistry, NamespaceId) {
        let mut registry = SchemaRegistry::new();
        let person = registry.declare(
            ObjectDecl::new("Person").with_field("name", FieldType::primitive(Primitive::String)),
        );
        let components = registry.create_namespace("components");
        let schemas = registry.child_namespace(components, "schemas");
        registry.mount(schemas, Member::entity(person));
        (registry, components)
    }

    #[test]
    fn test_lookup_finds_member_by_path() {
        let (registry, root) = build();
        let mut lookup = Lookup::new();

        let member = lookup.lookup(&registry, root, "schemas/Person").unwrap();
        assert_eq!(registry.member_name(&member), "Person");
    }

    #[test]
    fn test_lookup_ignores_surrounding_slashes() {
        let (registry, root) = build();
        let mut lookup = Lookup::new();

        assert!(lookup.lookup(&registry, root, "/schemas/Person/").is_some());
    }

    #[test]
    fn test_repeated_lookup_uses_cache() {
        let (registry, root) = build();
        let mut lookup = Lookup::new();

        let first = lookup.lookup(&registry, root, "schemas/Person").unwrap();
        let second = lookup.lookup(&registry, root, "schemas/Person").unwrap();
        assert_eq!(first, second);
        assert_eq!(lookup.walk_count(), 1);
    }

    #[test]
    fn test_missing_final_member_is_none() {
        let (registry, root) = build();
        let mut lookup = Lookup::new();

        assert!(lookup.lookup(&registry, root, "schemas/Missing").is_none());
    }

    #[test]
    fn test_missing_intermediate_segment_is_none() {
        let (registry, root) = build();
        let mut lookup = Lookup::new();

        assert!(lookup.lookup(&registry, root, "nowhere/Person").is_none());
    }

    #[test]
    fn test_empty_query_is_none() {
        let (registry, root) = build();
        let mut lookup = Lookup::new();

        assert!(lookup.lookup(&registry, root, "").is_none());
        assert!(lookup.lookup(&registry, root, "///").is_none());
    }

    #[test]
    fn test_single_segment_scans_root_members() {
        let (registry, root) = build();
        let mut lookup = Lookup::new();

        let member = lookup.lookup(&registry, root, "schemas").unwrap();
        assert_eq!(registry.member_name(&member), "schemas");
    }
}
