//! JSON schema snapshots and the models they describe
//!
//! A snapshot is exported from the application whose models are being
//! annotated. It lists, per model, the table's columns, its `belongs_to`
//! associations, its primary key and the source file holding the model.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fieldsync_meta::{AssociationDescriptor, Decimal, Registry, SchemaColumn, Value};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{DeclaredFields, SchemaIntrospectable, declared_fields_from_source};

/// Top-level snapshot document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub models: Vec<ModelSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub name: String,
    /// Defaults to the model name in snake case, pluralized with `s`.
    #[serde(default)]
    pub table: Option<String>,
    /// Source file, relative to the project root.
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Empty when the table does not exist.
    #[serde(default)]
    pub columns: Vec<ColumnSnapshot>,
    #[serde(default)]
    pub belongs_to: Vec<AssociationSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub sql_type: Option<String>,
    #[serde(default = "default_null")]
    pub null: bool,
    #[serde(default)]
    pub default: serde_json::Value,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub precision: Option<i64>,
    #[serde(default)]
    pub scale: Option<i64>,
    /// Adapter-specific attributes of custom types.
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_null() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationSnapshot {
    pub name: String,
    pub foreign_key: String,
    #[serde(default)]
    pub polymorphic: bool,
    #[serde(default)]
    pub foreign_type: Option<String>,
}

impl SchemaSnapshot {
    /// Parse a snapshot from JSON text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fieldsync_fs::read_text(path)?;
        let snapshot = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), models = snapshot.models.len(), "loaded schema snapshot");
        Ok(snapshot)
    }

    /// Resolve every model against `root`, reading the source files.
    ///
    /// Models whose file is listed but missing fail here; models without a
    /// file are kept and declare nothing.
    pub fn into_models(self, root: &Path) -> Result<Vec<SourceModel>> {
        self.models
            .into_iter()
            .map(|model| SourceModel::from_snapshot(model, root))
            .collect()
    }
}

fn json_to_value(type_name: &str, value: &serde_json::Value) -> Result<Value> {
    use serde_json::Value as Json;

    let converted = match value {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) if type_name == "decimal" => Value::Decimal(n.to_string().parse::<Decimal>()?),
        Json::String(s) if type_name == "decimal" => Value::Decimal(s.parse::<Decimal>()?),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Float(n.as_f64().unwrap_or_default()),
        },
        Json::String(s) => Value::String(s.clone()),
        other => {
            return Err(Error::Meta(fieldsync_meta::Error::Config {
                message: format!("unsupported column default: {other}"),
            }));
        }
    };
    Ok(converted)
}

impl ColumnSnapshot {
    /// Convert into the column descriptor the diff engine compares against.
    pub fn to_column(&self) -> Result<SchemaColumn> {
        let mut extra = BTreeMap::new();
        for (key, value) in &self.extra {
            extra.insert(key.clone(), json_to_value(&self.type_name, value)?);
        }
        Ok(SchemaColumn {
            name: self.name.clone(),
            type_name: self.type_name.clone(),
            sql_type: self.sql_type.clone().unwrap_or_else(|| self.type_name.clone()),
            nullable: self.null,
            default: json_to_value(&self.type_name, &self.default)?,
            limit: self.limit,
            precision: self.precision,
            scale: self.scale,
            extra,
        })
    }
}

impl From<&AssociationSnapshot> for AssociationDescriptor {
    fn from(snapshot: &AssociationSnapshot) -> Self {
        let descriptor = AssociationDescriptor::new(&snapshot.name, &snapshot.foreign_key);
        if snapshot.polymorphic {
            descriptor.polymorphic(snapshot.foreign_type.clone())
        } else {
            descriptor
        }
    }
}

/// `BookAuthor` -> `book_authors`
fn default_table_name(model: &str) -> String {
    let mut table = String::new();
    for c in model.chars() {
        if c.is_uppercase() {
            if !table.is_empty() {
                table.push('_');
            }
            table.extend(c.to_lowercase());
        } else if c == ':' {
            table.clear();
        } else {
            table.push(c);
        }
    }
    table.push('s');
    table
}

/// A model from a snapshot together with the text of its source file.
#[derive(Debug, Clone)]
pub struct SourceModel {
    name: String,
    table: String,
    path: Option<PathBuf>,
    source: Option<String>,
    columns: Vec<SchemaColumn>,
    associations: Vec<AssociationDescriptor>,
    primary_keys: Vec<String>,
}

impl SourceModel {
    /// Build a model from its snapshot entry, reading its file under `root`.
    pub fn from_snapshot(snapshot: ModelSnapshot, root: &Path) -> Result<Self> {
        let columns = snapshot
            .columns
            .iter()
            .map(ColumnSnapshot::to_column)
            .collect::<Result<Vec<_>>>()?;
        let associations = snapshot.belongs_to.iter().map(AssociationDescriptor::from).collect();
        let path = snapshot.file.map(|file| root.join(file));
        let source = match &path {
            Some(path) => Some(fieldsync_fs::read_text(path)?),
            None => None,
        };
        Ok(Self {
            table: snapshot.table.unwrap_or_else(|| default_table_name(&snapshot.name)),
            name: snapshot.name,
            path,
            source,
            columns,
            associations,
            primary_keys: snapshot.primary_key,
        })
    }

    /// A model with an in-memory source and no file on disk.
    pub fn in_memory(
        name: impl Into<String>,
        source: impl Into<String>,
        columns: Vec<SchemaColumn>,
        associations: Vec<AssociationDescriptor>,
        primary_keys: Vec<String>,
    ) -> Self {
        let name = name.into();
        Self {
            table: default_table_name(&name),
            name,
            path: None,
            source: Some(source.into()),
            columns,
            associations,
            primary_keys,
        }
    }

    /// Current source text, if the model has a file.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

impl SchemaIntrospectable for SourceModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn table_name(&self) -> &str {
        &self.table
    }

    fn source_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    fn belongs_to_associations(&self) -> &[AssociationDescriptor] {
        &self.associations
    }

    fn primary_key_names(&self) -> &[String] {
        &self.primary_keys
    }

    fn declared_fields(&self, registry: &Registry) -> Result<DeclaredFields> {
        match &self.source {
            Some(source) => declared_fields_from_source(&self.name, source, registry),
            None => Ok(DeclaredFields::Undeclared),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SNAPSHOT: &str = r#"{
        "models": [
            {
                "name": "Author",
                "table": "authors",
                "primary_key": ["id"],
                "columns": [
                    {"name": "id", "type": "integer", "null": false},
                    {"name": "name", "type": "string", "limit": 255},
                    {"name": "decnum", "type": "decimal", "precision": 10, "scale": 3, "default": "1.20"}
                ]
            },
            {
                "name": "Comment",
                "belongs_to": [
                    {"name": "commentable", "foreign_key": "commentable_id", "polymorphic": true}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_snapshot() {
        let snapshot = SchemaSnapshot::parse(SNAPSHOT).unwrap();
        assert_eq!(snapshot.models.len(), 2);
        let author = &snapshot.models[0];
        assert_eq!(author.primary_key, vec!["id"]);
        assert!(author.columns[1].null);
        assert!(!author.columns[0].null);
    }

    #[test]
    fn test_columns_convert() {
        let snapshot = SchemaSnapshot::parse(SNAPSHOT).unwrap();
        let models = snapshot.into_models(Path::new("/nonexistent")).unwrap();
        let author = &models[0];
        assert_eq!(author.table_name(), "authors");
        let decnum = &author.columns()[2];
        assert_eq!(decnum.default, Value::decimal("1.2").unwrap());
        assert_eq!(decnum.sql_type, "decimal");
        assert_eq!(decnum.precision, Some(10));
        assert_eq!(author.columns()[1].limit, Some(255));
    }

    #[test]
    fn test_defaults_for_missing_members() {
        let snapshot = SchemaSnapshot::parse(SNAPSHOT).unwrap();
        let models = snapshot.into_models(Path::new("/nonexistent")).unwrap();
        let comment = &models[1];
        assert_eq!(comment.table_name(), "comments");
        assert!(comment.columns().is_empty());
        assert_eq!(
            comment.belongs_to_associations()[0].columns(),
            vec!["commentable_id", "commentable_type"]
        );
        let declared = comment.declared_fields(&Registry::with_builtins()).unwrap();
        assert_eq!(declared, DeclaredFields::Undeclared);
    }

    #[test]
    fn test_missing_source_file_fails() {
        let snapshot = SchemaSnapshot::parse(r#"{"models": [{"name": "Ghost", "file": "ghost.rb"}]}"#).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = snapshot.into_models(dir.path());
        assert!(matches!(result, Err(Error::Fs(_))));
    }

    #[test]
    fn test_malformed_snapshot() {
        assert!(matches!(SchemaSnapshot::parse("{\"models\": 3}"), Err(Error::Snapshot(_))));
    }

    #[test]
    fn test_default_table_name() {
        assert_eq!(default_table_name("Author"), "authors");
        assert_eq!(default_table_name("BookAuthor"), "book_authors");
        assert_eq!(default_table_name("Library::Shelf"), "shelfs");
    }

    #[test]
    fn test_numeric_json_defaults() {
        let column: ColumnSnapshot =
            serde_json::from_str(r#"{"name": "ratio", "type": "float", "default": 0.5}"#).unwrap();
        assert_eq!(column.to_column().unwrap().default, Value::Float(0.5));
        let column: ColumnSnapshot =
            serde_json::from_str(r#"{"name": "price", "type": "decimal", "default": 9.99}"#).unwrap();
        assert_eq!(column.to_column().unwrap().default, Value::decimal("9.99").unwrap());
    }
}
