//! Member model and mount options

use crate::registry::{BodyId, NamespaceId};
use oas_model::EntityId;

/// Everything that can be mounted into a namespace.
///
/// A closed union: schema entities (object or array), namespaces, and
/// name-alias wrappers. Each variant has a resolved name (the alias name
/// wins over the wrapped member's own name), a mount hook, and a
/// serialized form; the registry dispatches on the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    /// A declared object or array entity
    Entity(EntityId),
    /// A namespace node
    Namespace(NamespaceId),
    /// A member mounted under a substitute name
    Alias {
        /// The substitute name
        name: String,
        /// The wrapped member
        inner: Box<Member>,
    },
}

impl Member {
    /// A schema entity member.
    pub fn entity(id: EntityId) -> Self {
        Self::Entity(id)
    }

    /// A namespace member.
    pub fn namespace(id: NamespaceId) -> Self {
        Self::Namespace(id)
    }

    /// Wrap a member under a substitute name.
    pub fn aliased(name: impl Into<String>, inner: Member) -> Self {
        Self::Alias {
            name: name.into(),
            inner: Box::new(inner),
        }
    }

    /// The namespace node behind this member, unwrapping aliases.
    pub(crate) fn namespace_id(&self) -> Option<NamespaceId> {
        match self {
            Self::Namespace(id) => Some(*id),
            Self::Alias { inner, .. } => inner.namespace_id(),
            Self::Entity(_) => None,
        }
    }

    /// The entity behind this member, unwrapping aliases.
    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            Self::Entity(id) => Some(*id),
            Self::Alias { inner, .. } => inner.entity_id(),
            Self::Namespace(_) => None,
        }
    }
}

/// Identity key for the per-namespace seen-set.
///
/// Namespaces are keyed by their shared body, so a namespace and its
/// mount-copies count as the same member for dedup purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberKey {
    Entity(EntityId),
    Namespace(BodyId),
    Alias(String, Box<MemberKey>),
}

/// Options for [`crate::SchemaRegistry::mount_with`].
#[derive(Debug, Clone, Default)]
pub struct MountOptions {
    /// Bypass the seen-set check and mount again
    pub force: bool,
    /// Mount under a substitute name
    pub rename: Option<String>,
}

impl MountOptions {
    /// Default options: dedup by identity, keep the member's own name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bypass the seen-set check.
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    /// Mount under a substitute name.
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_unwraps_to_entity() {
        let member = Member::aliased("Renamed", Member::entity(EntityId::from_index(3)));
        assert_eq!(member.entity_id(), Some(EntityId::from_index(3)));
        assert_eq!(member.namespace_id(), None);
    }

    #[test]
    fn test_mount_options_builders() {
        let options = MountOptions::new().force().rename("Other");
        assert!(options.force);
        assert_eq!(options.rename.as_deref(), Some("Other"));
    }
}
