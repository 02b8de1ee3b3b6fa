//! Core of fieldsync
//!
//! Keeps the `fields do ... end` block of a model source file in step with
//! the model's table:
//!
//! - [`diff`] computes new, modified and deleted fields from the declared
//!   fields and a schema snapshot.
//! - [`block`] parses the field block out of the source text, applies a
//!   diff to it and renders it back, touching nothing outside the block.
//! - [`migration`] turns a diff into migration text.
//! - [`sync`] runs all of the above over a set of models.

pub mod block;
pub mod diff;
pub mod error;
pub mod migration;
pub mod model;
pub mod snapshot;
pub mod sync;

pub use block::{BlockEntry, DeclarationBlock, MarkerStyle, apply_diff, parse_block, render};
pub use diff::{DiffResult, diff, diff_undeclared};
pub use error::{Error, Result};
pub use migration::Migration;
pub use model::{DeclaredFields, SchemaIntrospectable, declared_fields_from_source};
pub use snapshot::{SchemaSnapshot, SourceModel};
pub use sync::{CheckReport, FileChange, ModelFailure, ModelReport, Synchronizer, UpdateReport, WriteMode};
