//! Simulation Form Schema
//!
//! A schema document declares, for every model, the fields a user can edit:
//! their display name, their type, and the default value. Views group those
//! fields into a `basic` page and an `advanced` page.
//!
//! The schema is read once and never mutated. Everything downstream (form
//! state, committed models) is derived from a [`ResolvedSchema`], in which
//! every type reference has already been checked against the
//! [`TypeRegistry`]. A schema that names an unknown type never gets that far.
//!
//! # Modules
//!
//! - [`document`]: The raw schema document (`model`, `view`, `enum` sections)
//! - [`types`]: Type descriptors and the type registry
//! - [`resolve`]: Schema resolution against the registry
//! - [`error`]: Schema loading and resolution errors

pub mod document;
pub mod error;
pub mod resolve;
pub mod types;

pub use document::{FieldSchema, ModelSchema, SchemaDocument, ViewSchema};
pub use error::SchemaError;
pub use resolve::{FieldRef, FieldSpec, ModelSpec, ModelValue, ResolvedSchema, Subview, ViewSpec};
pub use types::{EnumOption, TypeDescriptor, TypeKind, TypeRegistry};
