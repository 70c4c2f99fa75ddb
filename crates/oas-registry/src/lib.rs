//! # oas-registry
//!
//! Namespace tree, mounting, resolver, and document rendering for OAS
//! documents.
//!
//! This crate is the mounting/resolution core: callers declare entities
//! from [`oas_model`] into a [`SchemaRegistry`], mount them into named
//! namespaces, and render the tree into a nested JSON-Schema-like
//! document with `$ref` cross-references. Mounting deduplicates by
//! identity, namespaces are copied on mount so one namespace can live
//! under several parents, and an entity embedded anywhere beyond its
//! top-level mount resolves to a stable path-based reference.

/// Declarative manifest loading (JSON/YAML) into a mounted registry.
pub mod loader;
/// Slash-path queries over a namespace tree, with a memo cache.
pub mod lookup;
/// The polymorphic member model and mount options.
pub mod member;
/// The registry arena: entities, namespaces, mounting, rendering.
pub mod registry;
/// Schema resolution: objects, arrays, fields, and references.
pub mod resolver;
/// Cached path-based cross-references.
pub mod xref;

pub use loader::{LoadedManifest, ManifestLoader};
pub use lookup::Lookup;
pub use member::{Member, MemberKey, MountOptions};
pub use registry::{BodyId, NamespaceId, SchemaRegistry};
pub use resolver::{History, ResolvedField, Resolver};
pub use xref::XRef;

use thiserror::Error;

/// Errors that can occur when building or rendering a document
#[derive(Error, Debug)]
pub enum Error {
    #[error("Primitive type error: {0}")]
    Primitive(#[from] oas_model::Error),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid manifest format: {0}")]
    InvalidFormat(String),

    #[error("Inheritance error: {0}")]
    Inheritance(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-local result type for registry operations.
pub type Result<T> = std::result::Result<T, Error>;
