//! Diff engine: declared fields against schema columns

use fieldsync_meta::{
    AssociationDescriptor, FieldDeclaration, PrimaryKeyPolicy, Registry, SchemaColumn, TypeDefinition, Value,
};

use crate::error::Result;

/// What separates a model's declared fields from its table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    /// Columns with no declaration, in column order.
    pub new_fields: Vec<FieldDeclaration>,
    /// Column-derived declarations carrying the declared specifiers.
    pub modified_fields: Vec<FieldDeclaration>,
    /// Declarations with no column.
    pub deleted_fields: Vec<FieldDeclaration>,
    /// The table has no columns at all.
    pub model_deleted: bool,
}

impl DiffResult {
    /// True if nothing needs to change.
    pub fn is_empty(&self) -> bool {
        self.new_fields.is_empty() && self.modified_fields.is_empty() && self.deleted_fields.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.new_fields.len() + self.modified_fields.len() + self.deleted_fields.len()
    }
}

/// Compare `declared` fields against the table's `columns`.
///
/// Primary-key columns excluded by `policy` and columns backing `associations`
/// never count as new. Identical inputs always give identical results.
///
/// # Errors
///
/// Fails with `UnknownType` as soon as a declared field or a column has a
/// type `registry` does not know, and with `Hook` if a column conversion
/// hook fails.
///
/// # Example
///
/// ```
/// use fieldsync_core::diff;
/// use fieldsync_meta::{FieldDeclaration, PrimaryKeyPolicy, Registry, SchemaColumn};
///
/// let registry = Registry::with_builtins();
/// let declared = vec![FieldDeclaration::new("title", "string")];
/// let columns = vec![
///     SchemaColumn::new("id", "integer"),
///     SchemaColumn::new("title", "string"),
///     SchemaColumn::new("pages", "integer"),
/// ];
/// let result = diff(&declared, &columns, &[], &["id".to_string()], PrimaryKeyPolicy::Never, &registry).unwrap();
/// assert_eq!(result.new_fields[0].name, "pages");
/// assert!(result.modified_fields.is_empty());
/// ```
pub fn diff(
    declared: &[FieldDeclaration],
    columns: &[SchemaColumn],
    associations: &[AssociationDescriptor],
    primary_keys: &[String],
    policy: PrimaryKeyPolicy,
    registry: &Registry,
) -> Result<DiffResult> {
    let model_deleted = columns.is_empty();
    let excluded_keys = policy.excluded(primary_keys);

    let mut association_columns: Vec<String> = Vec::new();
    for column in associations.iter().flat_map(AssociationDescriptor::columns) {
        if !association_columns.contains(&column) {
            association_columns.push(column);
        }
    }

    let is_declared = |name: &str| declared.iter().any(|d| d.name == name);
    let (accounted, unaccounted): (Vec<&SchemaColumn>, Vec<&SchemaColumn>) = columns.iter().partition(|c| {
        is_declared(&c.name) || association_columns.contains(&c.name) || excluded_keys.contains(&c.name.as_str())
    });
    let column_named = |name: &str| accounted.iter().copied().find(|c| c.name == name);

    let mut deleted_fields: Vec<FieldDeclaration> = declared
        .iter()
        .filter(|d| column_named(&d.name).is_none())
        .cloned()
        .collect();
    for name in &association_columns {
        if column_named(name).is_none() && !deleted_fields.iter().any(|d| &d.name == name) {
            deleted_fields.push(FieldDeclaration::new(name.as_str(), "integer"));
        }
    }

    let mut modified_fields = Vec::new();
    for declaration in declared {
        let Some(column) = column_named(&declaration.name) else {
            continue;
        };
        let mut from_column = registry.column_to_declaration(column)?;
        if !matches_column(declaration, &from_column, registry)? {
            from_column.specifiers = declaration.specifiers.clone();
            modified_fields.push(from_column);
        }
    }

    let new_fields = unaccounted
        .into_iter()
        .map(|column| registry.column_to_declaration(column))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let result = DiffResult {
        new_fields,
        modified_fields,
        deleted_fields,
        model_deleted,
    };
    tracing::debug!(
        new = result.new_fields.len(),
        modified = result.modified_fields.len(),
        deleted = result.deleted_fields.len(),
        model_deleted,
        "computed field diff"
    );
    Ok(result)
}

/// Diff for a model that has no field block at all.
///
/// Every column not backing an association or an excluded primary key is
/// new. Nothing is deleted or modified, so a vanished association column
/// is not reported for a model that never declared it.
pub fn diff_undeclared(
    columns: &[SchemaColumn],
    associations: &[AssociationDescriptor],
    primary_keys: &[String],
    policy: PrimaryKeyPolicy,
    registry: &Registry,
) -> Result<DiffResult> {
    let mut result = diff(&[], columns, associations, primary_keys, policy, registry)?;
    result.deleted_fields.clear();
    Ok(result)
}

/// True if `declared` describes the same column as `from_column`.
fn matches_column(declared: &FieldDeclaration, from_column: &FieldDeclaration, registry: &Registry) -> Result<bool> {
    let declared_type = registry.canonical_type(&declared.type_name);
    registry.lookup_type(declared_type)?;
    let column_type = registry.canonical_type(&from_column.type_name);
    if declared_type != column_type {
        return Ok(false);
    }

    let definition = registry.lookup_type(column_type)?;
    Ok(definition.keys().all(|key| {
        normalized(definition, key, declared.attributes.get(key))
            == normalized(definition, key, from_column.attributes.get(key))
    }))
}

/// Nil, `false` and the type default all mean "not set".
fn normalized<'a>(definition: &TypeDefinition, key: &str, value: Option<&'a Value>) -> Option<&'a Value> {
    value.filter(|v| !v.is_nil() && !v.is_false() && !definition.is_default(key, v))
}
