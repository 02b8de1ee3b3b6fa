//! Field metadata for fieldsync.
//!
//! This crate holds everything the diff and block engines need to reason
//! about a single field: attribute values, the `FieldDeclaration` value type
//! with its canonical text, the declaration-line syntax, the schema
//! descriptors handed over by the host model system, and the `Registry` of
//! types, aliases and hooks that is built once at startup.

pub mod config;
pub mod declaration;
pub mod error;
pub mod registry;
pub mod schema;
pub mod syntax;
pub mod value;

pub use config::{Config, CoreConfig, PrimaryKeyPolicy, TypeConfig};
pub use declaration::{Attributes, FieldDeclaration, Replacement, Specifier};
pub use error::{BoxError, Error, Result};
pub use registry::{ColumnConversion, FieldHook, MigrationHook, Registry, TypeDefinition};
pub use schema::{AssociationDescriptor, SchemaColumn};
pub use syntax::parse_declaration_line;
pub use value::{Decimal, Value};
