//! The registry arena: entities, namespaces, mounting, rendering

use crate::member::{Member, MemberKey, MountOptions};
use crate::resolver::{History, Resolver};
use crate::xref::XRef;
use crate::{Error, Result};
use oas_model::{EntityDecl, EntityId};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Handle to a namespace node.
///
/// Each node carries its own name and parent link; mount-copies of the
/// same namespace are distinct nodes sharing one [`BodyId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamespaceId(usize);

/// Handle to a namespace body: the containers (members, seen-set,
/// children) shared between a namespace and all of its mount-copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(usize);

#[derive(Debug)]
struct NamespaceNode {
    name: String,
    body: BodyId,
    parent: Option<NamespaceId>,
}

#[derive(Debug, Default)]
struct NamespaceBody {
    members: Vec<Member>,
    seen: HashSet<MemberKey>,
    children: HashMap<String, NamespaceId>,
}

/// Arena owning entity declarations, their cached cross-references, and
/// the namespace tree.
///
/// Handles ([`EntityId`], [`NamespaceId`]) are arena indices and are only
/// meaningful with the registry that minted them. Construction is
/// single-writer: declare and mount first, then render any number of
/// times. Rendering is side-effect-free except for the one-time
/// cross-reference attachment on an entity's first nested resolution.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entities: Vec<EntityDecl>,
    xrefs: Vec<Option<XRef>>,
    nodes: Vec<NamespaceNode>,
    bodies: Vec<NamespaceBody>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity declaration and mint its handle.
    pub fn declare(&mut self, decl: impl Into<EntityDecl>) -> EntityId {
        let decl = decl.into();
        trace!("declaring entity: {}", decl.name());
        self.entities.push(decl);
        self.xrefs.push(None);
        EntityId::from_index(self.entities.len() - 1)
    }

    /// Swap in a final declaration for a previously minted handle.
    ///
    /// Supports two-pass linking of mutually or self-referential
    /// declarations: mint handles first, fill them in once every handle
    /// exists. Declarations must not change once mounting or rendering
    /// has begun.
    pub fn redeclare(&mut self, id: EntityId, decl: impl Into<EntityDecl>) {
        self.entities[id.index()] = decl.into();
    }

    /// The declaration behind a handle.
    pub fn entity(&self, id: EntityId) -> &EntityDecl {
        &self.entities[id.index()]
    }

    /// Create a standalone (parentless) namespace node.
    pub fn create_namespace(&mut self, name: impl Into<String>) -> NamespaceId {
        let body = BodyId(self.bodies.len());
        self.bodies.push(NamespaceBody::default());
        self.nodes.push(NamespaceNode {
            name: name.into(),
            body,
            parent: None,
        });
        NamespaceId(self.nodes.len() - 1)
    }

    /// The name of a namespace node.
    pub fn namespace_name(&self, ns: NamespaceId) -> &str {
        &self.node(ns).name
    }

    /// The parent of a namespace node, if it was mounted.
    pub fn parent(&self, ns: NamespaceId) -> Option<NamespaceId> {
        self.node(ns).parent
    }

    /// The child namespace registered under `name`, if any.
    pub fn child(&self, ns: NamespaceId, name: &str) -> Option<NamespaceId> {
        self.body(self.node(ns).body).children.get(name).copied()
    }

    /// The members mounted into a namespace, in mount order.
    pub fn members(&self, ns: NamespaceId) -> &[Member] {
        &self.body(self.node(ns).body).members
    }

    /// Return the existing child namespace of that name, or lazily
    /// construct and mount a new one. Idempotent.
    pub fn child_namespace(&mut self, ns: NamespaceId, name: impl Into<String>) -> NamespaceId {
        let name = name.into();
        if let Some(existing) = self.child(ns, &name) {
            return existing;
        }
        let fresh = self.create_namespace(name);
        match self.mount_internal(ns, Member::namespace(fresh), MountOptions::new()) {
            Some(Member::Namespace(copy)) => copy,
            _ => fresh,
        }
    }

    /// Mount a member into a namespace with default options.
    ///
    /// A no-op when the member is already in the namespace's seen-set.
    /// Mounting an array entity transitively mounts its items entity
    /// first unless it is already present somewhere in the subtree;
    /// mounting a namespace appends a structural copy and registers it
    /// as a child.
    pub fn mount(&mut self, ns: NamespaceId, member: Member) {
        self.mount_with(ns, member, MountOptions::new());
    }

    /// Mount with explicit options (`force`, `rename`).
    pub fn mount_with(&mut self, ns: NamespaceId, member: Member, options: MountOptions) {
        self.mount_internal(ns, member, options);
    }

    fn mount_internal(
        &mut self,
        ns: NamespaceId,
        member: Member,
        options: MountOptions,
    ) -> Option<Member> {
        let body = self.node(ns).body;
        let raw_key = self.member_key(&member);
        if !options.force && self.body(body).seen.contains(&raw_key) {
            trace!(
                "skipping mount of already-seen member in namespace '{}'",
                self.node(ns).name
            );
            return None;
        }

        let member = match options.rename {
            Some(name) => Member::aliased(name, member),
            None => member,
        };
        let key = self.member_key(&member);
        if !options.force && key != raw_key && self.body(body).seen.contains(&key) {
            return None;
        }

        // Registered before the mount hook runs so a self-referential
        // items chain cannot recurse back into this mount.
        self.body_mut(body).seen.insert(key);
        let mounted = self.on_mount(ns, member);
        if let Some(child) = mounted.namespace_id() {
            let child_name = self.node(child).name.clone();
            self.body_mut(body).children.insert(child_name, child);
        }
        self.body_mut(body).members.push(mounted.clone());
        Some(mounted)
    }

    /// The per-variant mount hook: entities mount their items
    /// transitively, namespaces are copied with the mount site as
    /// parent, aliases forward to the wrapped member.
    fn on_mount(&mut self, ns: NamespaceId, member: Member) -> Member {
        match member {
            Member::Entity(id) => {
                if let EntityDecl::Array(array) = self.entity(id) {
                    let items = array.items;
                    if !self.contains(ns, &Member::entity(items)) {
                        self.mount(ns, Member::entity(items));
                    }
                }
                Member::Entity(id)
            }
            Member::Namespace(id) => Member::Namespace(self.copy_namespace(id, ns, None)),
            Member::Alias { name, inner } => match *inner {
                // A renamed namespace mount becomes a copy carrying the
                // substitute name, so child registration, serialization,
                // and reference paths all agree on it.
                Member::Namespace(id) => {
                    Member::Namespace(self.copy_namespace(id, ns, Some(name)))
                }
                other => {
                    let mounted = self.on_mount(ns, other);
                    Member::aliased(name, mounted)
                }
            },
        }
    }

    fn copy_namespace(
        &mut self,
        id: NamespaceId,
        parent: NamespaceId,
        rename: Option<String>,
    ) -> NamespaceId {
        let node = self.node(id);
        let name = rename.unwrap_or_else(|| node.name.clone());
        let body = node.body;
        self.nodes.push(NamespaceNode {
            name,
            body,
            parent: Some(parent),
        });
        NamespaceId(self.nodes.len() - 1)
    }

    /// True when the member is in this namespace's seen-set or,
    /// recursively, in any child's.
    pub fn contains(&self, ns: NamespaceId, member: &Member) -> bool {
        let key = self.member_key(member);
        let mut visited = HashSet::new();
        self.contains_key(self.node(ns).body, &key, &mut visited)
    }

    fn contains_key(&self, body: BodyId, key: &MemberKey, visited: &mut HashSet<BodyId>) -> bool {
        // Mutually mounted namespaces would otherwise loop.
        if !visited.insert(body) {
            return false;
        }
        let b = self.body(body);
        if b.seen.contains(key) {
            return true;
        }
        b.children
            .values()
            .any(|child| self.contains_key(self.node(*child).body, key, visited))
    }

    /// The identity key used for a member in seen-sets.
    pub fn member_key(&self, member: &Member) -> MemberKey {
        match member {
            Member::Entity(id) => MemberKey::Entity(*id),
            Member::Namespace(id) => MemberKey::Namespace(self.node(*id).body),
            Member::Alias { name, inner } => {
                MemberKey::Alias(name.clone(), Box::new(self.member_key(inner)))
            }
        }
    }

    /// The resolved name of a member: the alias name when renamed,
    /// otherwise the entity's or namespace's own name.
    pub fn member_name<'a>(&'a self, member: &'a Member) -> &'a str {
        match member {
            Member::Entity(id) => self.entity(*id).name(),
            Member::Namespace(id) => &self.node(*id).name,
            Member::Alias { name, .. } => name,
        }
    }

    /// Render the namespace into the in-memory document.
    ///
    /// A top-level (parentless) node wraps the body mapping under its own
    /// name; a nested node returns the bare mapping, because its parent
    /// supplies the name as a key.
    pub fn as_document(&mut self, ns: NamespaceId, resolver: &Resolver) -> Result<Value> {
        let mut history = History::new();
        let body = self.namespace_dict(ns, resolver, &mut history)?;
        if self.node(ns).parent.is_some() {
            return Ok(body);
        }
        let mut wrapped = Map::new();
        wrapped.insert(self.node(ns).name.clone(), body);
        Ok(Value::Object(wrapped))
    }

    pub(crate) fn namespace_dict(
        &mut self,
        ns: NamespaceId,
        resolver: &Resolver,
        history: &mut History,
    ) -> Result<Value> {
        history.push_namespace(ns);
        let members = self.body(self.node(ns).body).members.clone();
        let mut map = Map::new();
        for member in &members {
            let name = self.member_name(member).to_string();
            let value = self.member_dict(member, resolver, history)?;
            map.insert(name, value);
        }
        history.pop();
        Ok(Value::Object(map))
    }

    fn member_dict(
        &mut self,
        member: &Member,
        resolver: &Resolver,
        history: &mut History,
    ) -> Result<Value> {
        match member {
            Member::Entity(id) => {
                let is_object = matches!(self.entity(*id), EntityDecl::Object(_));
                if is_object {
                    resolver.resolve_object(self, *id, history)
                } else {
                    resolver.resolve_array(self, *id, history)
                }
            }
            Member::Namespace(id) => self.namespace_dict(*id, resolver, history),
            Member::Alias { inner, .. } => self.member_dict(inner, resolver, history),
        }
    }

    /// The `{"$ref": ...}` value for an entity reached through nested
    /// resolution, attaching a cross-reference on first touch.
    pub(crate) fn reference_value(&mut self, id: EntityId, history: &History) -> Value {
        if let Some(xref) = &mut self.xrefs[id.index()] {
            return xref.as_value();
        }

        let chain = history.namespace_chain();
        let mounted_somewhere = chain
            .iter()
            .any(|ns| self.contains(*ns, &Member::entity(id)));
        if !mounted_somewhere {
            debug!(
                "attaching reference to entity '{}' with no mount under the current namespace chain",
                self.entity(id).name()
            );
        }

        let segments: Vec<String> = chain
            .iter()
            .map(|ns| self.node(*ns).name.clone())
            .collect();
        let mut xref = XRef::new(segments, self.entity(id).name());
        let value = xref.as_value();
        self.xrefs[id.index()] = Some(xref);
        value
    }

    /// Ordered field sources for an object entity: the entity itself,
    /// then its ancestors depth-first in declared order, each id once.
    pub(crate) fn field_sources(&self, id: EntityId) -> Result<Vec<EntityId>> {
        let mut ordered = Vec::new();
        let mut seen = HashSet::new();
        self.collect_sources(id, id, &mut ordered, &mut seen)?;
        Ok(ordered)
    }

    fn collect_sources(
        &self,
        origin: EntityId,
        id: EntityId,
        ordered: &mut Vec<EntityId>,
        seen: &mut HashSet<EntityId>,
    ) -> Result<()> {
        if !seen.insert(id) {
            return Ok(());
        }
        match self.entity(id) {
            EntityDecl::Object(object) => {
                ordered.push(id);
                for parent in &object.parents {
                    self.collect_sources(origin, *parent, ordered, seen)?;
                }
                Ok(())
            }
            EntityDecl::Array(array) => Err(Error::Inheritance(format!(
                "ancestor '{}' of '{}' is not an object entity",
                array.name,
                self.entity(origin).name()
            ))),
        }
    }

    fn node(&self, id: NamespaceId) -> &NamespaceNode {
        &self.nodes[id.0]
    }

    fn body(&self, id: BodyId) -> &NamespaceBody {
        &self.bodies[id.0]
    }

    fn body_mut(&mut self, id: BodyId) -> &mut NamespaceBody {
        &mut self.bodies[id.0]
    }
}
