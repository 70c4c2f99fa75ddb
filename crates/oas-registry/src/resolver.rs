//! Schema resolution: objects, arrays, fields, and references

use crate::registry::{NamespaceId, SchemaRegistry};
use crate::Result;
use oas_model::{EntityDecl, EntityId, FieldDecl, FieldType, TypeGuesser};
use serde_json::{Map, Value, json};
use std::collections::HashSet;

/// The chain of namespaces and entities traversed during one resolution
/// call. Cross-reference paths are computed from the namespace frames.
#[derive(Debug, Default)]
pub struct History {
    frames: Vec<Frame>,
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Namespace(NamespaceId),
    Entity(EntityId),
}

impl History {
    /// An empty history, for starting resolution at a document root.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_namespace(&mut self, ns: NamespaceId) {
        self.frames.push(Frame::Namespace(ns));
    }

    pub(crate) fn push_entity(&mut self, id: EntityId) {
        self.frames.push(Frame::Entity(id));
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    /// The namespace frames in traversal order.
    pub fn namespace_chain(&self) -> Vec<NamespaceId> {
        self.frames
            .iter()
            .filter_map(|frame| match frame {
                Frame::Namespace(ns) => Some(*ns),
                Frame::Entity(_) => None,
            })
            .collect()
    }
}

/// One resolved field: its serialized descriptor and whether the owning
/// object lists it as required. The flag is hoisted into the object's
/// `required` list and is not part of the descriptor itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub descriptor: Value,
    pub required: bool,
}

/// Turns declared entities into their serialized form.
///
/// An explicit, constructible instance: create one at startup and pass
/// it through rendering calls. Holds the primitive fragment table and
/// the set of property names never treated as user fields.
#[derive(Debug, Clone)]
pub struct Resolver {
    guesser: TypeGuesser,
    ignored: HashSet<String>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// A resolver with the built-in primitive fragments and an empty
    /// ignore set.
    pub fn new() -> Self {
        Self::with_guesser(TypeGuesser::with_builtins())
    }

    /// A resolver with a custom fragment table.
    pub fn with_guesser(guesser: TypeGuesser) -> Self {
        Self {
            guesser,
            ignored: HashSet::new(),
        }
    }

    /// Never treat `name` as a user field when resolving objects.
    pub fn ignore_field(&mut self, name: impl Into<String>) {
        self.ignored.insert(name.into());
    }

    /// Resolve an object entity to its inline serialized form.
    ///
    /// Emits `type`, optional `description`, `properties` from the
    /// ancestor-ordered field walk (first-seen name wins; ignored and
    /// underscore-prefixed names are skipped), and the `required` name
    /// list (omitted when empty).
    pub fn resolve_object(
        &self,
        registry: &mut SchemaRegistry,
        id: EntityId,
        history: &mut History,
    ) -> Result<Value> {
        history.push_entity(id);
        let result = self.object_dict(registry, id, history);
        history.pop();
        result
    }

    fn object_dict(
        &self,
        registry: &mut SchemaRegistry,
        id: EntityId,
        history: &mut History,
    ) -> Result<Value> {
        let mut map = Map::new();
        map.insert("type".to_string(), json!("object"));
        if let Some(description) = registry.entity(id).description() {
            map.insert("description".to_string(), json!(description));
        }

        let sources = registry.field_sources(id)?;
        let mut properties = Map::new();
        let mut required = Vec::new();
        for source in sources {
            let fields: Vec<FieldDecl> = match registry.entity(source) {
                EntityDecl::Object(object) => object.fields.clone(),
                EntityDecl::Array(_) => Vec::new(),
            };
            for field in fields {
                if properties.contains_key(&field.name)
                    || self.ignored.contains(&field.name)
                    || field.name.starts_with('_')
                {
                    continue;
                }
                let resolved = self.resolve_field(registry, &field.ty, history)?;
                if resolved.required {
                    required.push(field.name.clone());
                }
                properties.insert(field.name, resolved.descriptor);
            }
        }

        if !properties.is_empty() {
            map.insert("properties".to_string(), Value::Object(properties));
            if !required.is_empty() {
                map.insert("required".to_string(), json!(required));
            }
        }
        Ok(Value::Object(map))
    }

    /// Resolve an array entity to its inline serialized form: `type`,
    /// optional `description`, and `items` (always a reference).
    pub fn resolve_array(
        &self,
        registry: &mut SchemaRegistry,
        id: EntityId,
        history: &mut History,
    ) -> Result<Value> {
        history.push_entity(id);
        let result = self.array_dict(registry, id, history);
        history.pop();
        result
    }

    fn array_dict(
        &self,
        registry: &mut SchemaRegistry,
        id: EntityId,
        history: &mut History,
    ) -> Result<Value> {
        let items = match registry.entity(id) {
            EntityDecl::Array(array) => array.items,
            EntityDecl::Object(object) => {
                // Dispatch in the registry guarantees this arm is dead.
                return Err(crate::Error::NotFound(format!(
                    "array items for object entity '{}'",
                    object.name
                )));
            }
        };

        let mut map = Map::new();
        map.insert("type".to_string(), json!("array"));
        if let Some(description) = registry.entity(id).description() {
            map.insert("description".to_string(), json!(description));
        }
        let items_ty = FieldType::entity(items);
        map.insert(
            "items".to_string(),
            self.resolve_type(registry, &items_ty, history)?,
        );
        Ok(Value::Object(map))
    }

    /// Resolve one field declaration to its descriptor and required
    /// flag. An optional wrapper marks the field not-required and is
    /// unwrapped one level before the type resolves.
    pub fn resolve_field(
        &self,
        registry: &mut SchemaRegistry,
        ty: &FieldType,
        history: &mut History,
    ) -> Result<ResolvedField> {
        let (ty, required) = match ty {
            FieldType::Optional(inner) => (inner.as_ref(), false),
            other => (other, true),
        };
        let descriptor = self.resolve_type(registry, ty, history)?;
        Ok(ResolvedField {
            descriptor,
            required,
        })
    }

    /// Resolve a field type to a descriptor value.
    ///
    /// Primitives resolve to their registered fragment. Entities resolve
    /// by reference: the first nested touch attaches a cross-reference
    /// computed from the namespaces currently in history, and every
    /// later touch reuses it, so repeated and self-recursive embeddings
    /// always point at the same path.
    pub fn resolve_type(
        &self,
        registry: &mut SchemaRegistry,
        ty: &FieldType,
        history: &mut History,
    ) -> Result<Value> {
        match ty {
            FieldType::Primitive(kind) => Ok(self.guesser.resolve(*kind)?.clone()),
            FieldType::Optional(inner) => self.resolve_type(registry, inner, history),
            FieldType::Entity(id) => Ok(registry.reference_value(*id, history)),
        }
    }
}
