//! Declarative manifest loading

use crate::member::{Member, MountOptions};
use crate::registry::{NamespaceId, SchemaRegistry};
use crate::{Error, Result};
use oas_model::{ArrayDecl, EntityDecl, EntityId, FieldType, ObjectDecl, Primitive};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Serializable manifest format for loading from files
#[derive(Debug, Deserialize)]
struct ManifestFile {
    /// Root namespace name
    document: String,
    #[serde(default)]
    entities: Vec<EntityFile>,
    #[serde(default)]
    namespaces: Vec<NamespaceFile>,
    #[serde(default)]
    mount: Vec<MountFile>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum KindFile {
    Object,
    Array,
}

#[derive(Debug, Deserialize)]
struct EntityFile {
    name: String,
    kind: KindFile,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    fields: Vec<FieldFile>,
    #[serde(default)]
    items: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FieldFile {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    optional: bool,
}

#[derive(Debug, Deserialize)]
struct NamespaceFile {
    name: String,
    #[serde(default)]
    mount: Vec<MountFile>,
    #[serde(default)]
    namespaces: Vec<NamespaceFile>,
}

/// A mount entry: a plain entity name, or a renamed mount.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
enum MountFile {
    Name(String),
    Renamed {
        name: String,
        #[serde(rename = "as")]
        alias: String,
    },
}

/// A manifest loaded into a mounted registry, ready to render.
#[derive(Debug)]
pub struct LoadedManifest {
    /// The populated registry
    pub registry: SchemaRegistry,
    /// The root namespace named by the manifest's `document` key
    pub root: NamespaceId,
}

/// Loads declarative JSON/YAML manifests into a [`SchemaRegistry`].
///
/// Entities may reference each other in any declaration order; linking
/// is two-pass (names first, declarations second).
#[derive(Debug, Default)]
pub struct ManifestLoader;

impl ManifestLoader {
    /// Create a loader.
    pub fn new() -> Self {
        Self
    }

    /// Load a manifest file, dispatching on the `.yaml`/`.yml`
    /// extension; anything else is parsed as JSON.
    pub fn load_from_file(&self, path: &Path) -> Result<LoadedManifest> {
        debug!("loading manifest from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        if path
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            self.load_from_yaml(&content)
        } else {
            self.load_from_json(&content)
        }
    }

    /// Load a manifest from a JSON string.
    pub fn load_from_json(&self, json: &str) -> Result<LoadedManifest> {
        let manifest: ManifestFile = serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {}", e)))?;
        self.link(manifest)
    }

    /// Load a manifest from a YAML string.
    pub fn load_from_yaml(&self, yaml: &str) -> Result<LoadedManifest> {
        let manifest: ManifestFile = serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {}", e)))?;
        self.link(manifest)
    }

    fn link(&self, manifest: ManifestFile) -> Result<LoadedManifest> {
        let mut registry = SchemaRegistry::new();

        // Pass one: mint a handle per name so declarations may reference
        // entities in any order.
        let mut handles: HashMap<String, EntityId> = HashMap::new();
        for entity in &manifest.entities {
            if handles.contains_key(&entity.name) {
                return Err(Error::InvalidFormat(format!(
                    "duplicate entity name: {}",
                    entity.name
                )));
            }
            let id = registry.declare(ObjectDecl::new(entity.name.clone()));
            handles.insert(entity.name.clone(), id);
        }

        // Pass two: build the real declarations.
        for entity in &manifest.entities {
            let id = handles[&entity.name];
            let decl = self.build_entity(entity, &handles)?;
            registry.redeclare(id, decl);
        }

        let root = registry.create_namespace(manifest.document.clone());
        self.mount_all(&mut registry, root, &manifest.mount, &handles)?;
        for namespace in &manifest.namespaces {
            self.wire_namespace(&mut registry, root, namespace, &handles)?;
        }

        info!(
            "loaded manifest '{}': {} entities, {} top-level namespaces",
            manifest.document,
            manifest.entities.len(),
            manifest.namespaces.len()
        );
        Ok(LoadedManifest { registry, root })
    }

    fn build_entity(
        &self,
        entity: &EntityFile,
        handles: &HashMap<String, EntityId>,
    ) -> Result<EntityDecl> {
        match entity.kind {
            KindFile::Object => {
                if entity.items.is_some() {
                    return Err(Error::InvalidFormat(format!(
                        "object entity '{}' may not declare items",
                        entity.name
                    )));
                }
                let mut decl = ObjectDecl::new(entity.name.clone());
                if let Some(description) = &entity.description {
                    decl = decl.with_description(description.clone());
                }
                for parent in &entity.parents {
                    let parent_id = *handles.get(parent).ok_or_else(|| {
                        Error::NotFound(format!(
                            "parent '{}' of entity '{}'",
                            parent, entity.name
                        ))
                    })?;
                    decl = decl.with_parent(parent_id);
                }
                for field in &entity.fields {
                    let ty = self.field_type(field, &entity.name, handles)?;
                    decl = decl.with_field(field.name.clone(), ty);
                }
                Ok(decl.into())
            }
            KindFile::Array => {
                if !entity.fields.is_empty() || !entity.parents.is_empty() {
                    return Err(Error::InvalidFormat(format!(
                        "array entity '{}' may not declare fields or parents",
                        entity.name
                    )));
                }
                let items = entity.items.as_ref().ok_or_else(|| {
                    Error::InvalidFormat(format!(
                        "array entity '{}' is missing items",
                        entity.name
                    ))
                })?;
                let items_id = *handles.get(items).ok_or_else(|| {
                    Error::NotFound(format!("items '{}' of entity '{}'", items, entity.name))
                })?;
                let mut decl = ArrayDecl::new(entity.name.clone(), items_id);
                if let Some(description) = &entity.description {
                    decl = decl.with_description(description.clone());
                }
                Ok(decl.into())
            }
        }
    }

    fn field_type(
        &self,
        field: &FieldFile,
        owner: &str,
        handles: &HashMap<String, EntityId>,
    ) -> Result<FieldType> {
        let base = match Primitive::from_name(&field.type_name) {
            Ok(kind) => FieldType::primitive(kind),
            Err(_) => match handles.get(&field.type_name) {
                Some(id) => FieldType::entity(*id),
                None => {
                    return Err(Error::NotFound(format!(
                        "type '{}' of field '{}.{}'",
                        field.type_name, owner, field.name
                    )));
                }
            },
        };
        Ok(if field.optional { base.optional() } else { base })
    }

    fn wire_namespace(
        &self,
        registry: &mut SchemaRegistry,
        parent: NamespaceId,
        namespace: &NamespaceFile,
        handles: &HashMap<String, EntityId>,
    ) -> Result<()> {
        let ns = registry.child_namespace(parent, namespace.name.clone());
        self.mount_all(registry, ns, &namespace.mount, handles)?;
        for nested in &namespace.namespaces {
            self.wire_namespace(registry, ns, nested, handles)?;
        }
        Ok(())
    }

    fn mount_all(
        &self,
        registry: &mut SchemaRegistry,
        ns: NamespaceId,
        mounts: &[MountFile],
        handles: &HashMap<String, EntityId>,
    ) -> Result<()> {
        for mount in mounts {
            let (name, alias) = match mount {
                MountFile::Name(name) => (name, None),
                MountFile::Renamed { name, alias } => (name, Some(alias.clone())),
            };
            let id = *handles
                .get(name)
                .ok_or_else(|| Error::NotFound(format!("mounted entity '{}'", name)))?;
            let options = match alias {
                Some(alias) => MountOptions::new().rename(alias),
                None => MountOptions::new(),
            };
            registry.mount_with(ns, Member::entity(id), options);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_json() {
        let loader = ManifestLoader::new();
        let json = r#"
        {
            "document": "components",
            "entities": [
                {
                    "name": "Person",
                    "kind": "object",
                    "fields": [
                        {"name": "name", "type": "string"},
                        {"name": "age", "type": "integer"}
                    ]
                }
            ],
            "namespaces": [
                {"name": "schemas", "mount": ["Person"]}
            ]
        }
        "#;
        let loaded = loader.load_from_json(json).unwrap();
        assert_eq!(loaded.registry.namespace_name(loaded.root), "components");
        let schemas = loaded.registry.child(loaded.root, "schemas").unwrap();
        assert_eq!(loaded.registry.members(schemas).len(), 1);
    }

    #[test]
    fn test_load_from_yaml_with_forward_reference() {
        let loader = ManifestLoader::new();
        let yaml = r#"
document: components
entities:
  - name: People
    kind: array
    items: Person
  - name: Person
    kind: object
    fields:
      - name: name
        type: string
namespaces:
  - name: schemas
    mount: [People]
"#;
        let loaded = loader.load_from_yaml(yaml).unwrap();
        let schemas = loaded.registry.child(loaded.root, "schemas").unwrap();
        // Items are pulled in ahead of the array.
        let names: Vec<String> = loaded
            .registry
            .members(schemas)
            .iter()
            .map(|m| loaded.registry.member_name(m).to_string())
            .collect();
        assert_eq!(names, ["Person", "People"]);
    }

    #[test]
    fn test_renamed_mount() {
        let loader = ManifestLoader::new();
        let yaml = r#"
document: components
entities:
  - name: Person
    kind: object
namespaces:
  - name: schemas
    mount:
      - name: Person
        as: Human
"#;
        let loaded = loader.load_from_yaml(yaml).unwrap();
        let schemas = loaded.registry.child(loaded.root, "schemas").unwrap();
        let member = &loaded.registry.members(schemas)[0];
        assert_eq!(loaded.registry.member_name(member), "Human");
    }

    #[test]
    fn test_unknown_field_type_is_not_found() {
        let loader = ManifestLoader::new();
        let yaml = r#"
document: components
entities:
  - name: Person
    kind: object
    fields:
      - name: pet
        type: Animal
"#;
        match loader.load_from_yaml(yaml) {
            Err(Error::NotFound(message)) => assert!(message.contains("Animal")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_mount_is_not_found() {
        let loader = ManifestLoader::new();
        let yaml = r#"
document: components
namespaces:
  - name: schemas
    mount: [Ghost]
"#;
        assert!(matches!(
            loader.load_from_yaml(yaml),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_array_without_items_is_invalid() {
        let loader = ManifestLoader::new();
        let yaml = r#"
document: components
entities:
  - name: People
    kind: array
"#;
        assert!(matches!(
            loader.load_from_yaml(yaml),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_duplicate_entity_name_is_invalid() {
        let loader = ManifestLoader::new();
        let yaml = r#"
document: components
entities:
  - name: Person
    kind: object
  - name: Person
    kind: object
"#;
        assert!(matches!(
            loader.load_from_yaml(yaml),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_invalid_format() {
        let loader = ManifestLoader::new();
        assert!(matches!(
            loader.load_from_json("not valid json"),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_array_parent_is_inheritance_error_at_render() {
        let loader = ManifestLoader::new();
        let yaml = r#"
document: components
entities:
  - name: Person
    kind: object
  - name: People
    kind: array
    items: Person
  - name: Child
    kind: object
    parents: [People]
namespaces:
  - name: schemas
    mount: [Child]
"#;
        let mut loaded = loader.load_from_yaml(yaml).unwrap();
        let resolver = crate::Resolver::new();
        let result = loaded.registry.as_document(loaded.root, &resolver);
        assert!(matches!(result, Err(Error::Inheritance(_))));
    }
}
