//! The capability a host model system provides to the diff engine

use std::path::Path;
use std::sync::LazyLock;

use fieldsync_meta::{AssociationDescriptor, FieldDeclaration, Registry, SchemaColumn, parse_declaration_line};
use regex::Regex;

use crate::block::parser::scan;
use crate::error::Result;

/// Marks a model whose fields are deliberately not tracked.
static OMITTED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*fields\s+:omitted\b").expect("Invalid omitted regex"));

/// Fields a model declares.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredFields {
    /// The model opted out; it is skipped entirely.
    Omitted,
    /// The model has no field block yet. Its columns can only be new.
    Undeclared,
    Fields(Vec<FieldDeclaration>),
}

impl DeclaredFields {
    /// The declarations, or an empty slice for an omitted or undeclared model.
    pub fn as_slice(&self) -> &[FieldDeclaration] {
        match self {
            DeclaredFields::Omitted | DeclaredFields::Undeclared => &[],
            DeclaredFields::Fields(fields) => fields,
        }
    }
}

/// Read-only view of one model and its table.
///
/// A missing table is reported as an empty column list, never as an error.
pub trait SchemaIntrospectable {
    /// Model name, e.g. `Author`.
    fn name(&self) -> &str;

    /// Table the model is stored in.
    fn table_name(&self) -> &str;

    /// Source file holding the model's field block, if there is one.
    fn source_path(&self) -> Option<&Path> {
        None
    }

    /// Columns of the table in their natural order.
    fn columns(&self) -> &[SchemaColumn];

    /// `belongs_to` associations, including those of subtypes sharing the table.
    fn belongs_to_associations(&self) -> &[AssociationDescriptor];

    fn primary_key_names(&self) -> &[String];

    /// Declarations currently written in the model, validated by `registry`.
    fn declared_fields(&self, registry: &Registry) -> Result<DeclaredFields>;
}

/// Read the declarations out of a model source file.
///
/// Every line inside the field block is parsed and passed through
/// [`Registry::declare`]. A file without a block is `Undeclared`, and a
/// `fields :omitted` line marks the model omitted.
pub fn declared_fields_from_source(
    model: &str,
    source: &str,
    registry: &Registry,
) -> Result<DeclaredFields> {
    if OMITTED_REGEX.is_match(source) {
        tracing::debug!(model, "model is omitted");
        return Ok(DeclaredFields::Omitted);
    }

    let scanned = scan(source);
    if scanned.open_marker.is_none() {
        return Ok(DeclaredFields::Undeclared);
    }

    let mut fields = Vec::new();
    for entry in &scanned.entries {
        for declaration in parse_declaration_line(&entry.raw_line)? {
            fields.push(registry.declare(model, declaration)?);
        }
    }
    Ok(DeclaredFields::Fields(fields))
}
