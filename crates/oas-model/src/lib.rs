#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # oas-model
//!
//! Primitive type table and entity declaration model for OAS documents.
//!
//! This crate holds the leaf data model: the closed set of primitive kinds
//! with their schema-descriptor fragments, and the declarations of object
//! and array entities that the registry crate mounts and renders. It knows
//! nothing about namespaces, mounting, or document output.

/// Entity declarations, field types, and entity handles.
pub mod entity;
/// Primitive kinds and the kind-to-descriptor fragment table.
pub mod primitive;

pub use entity::{ArrayDecl, EntityDecl, EntityId, FieldDecl, FieldType, ObjectDecl};
pub use primitive::{Primitive, TypeGuesser};

use thiserror::Error;

/// Errors that can occur in the declaration model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unsupported primitive kind: {0}")]
    UnsupportedKind(Primitive),

    #[error("Unknown primitive name: {0}")]
    UnknownPrimitiveName(String),
}

/// Crate-local result type for model operations.
pub type Result<T> = std::result::Result<T, Error>;
