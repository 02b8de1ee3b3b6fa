//! Read-only descriptors supplied by the host model system

use std::collections::BTreeMap;

use crate::value::Value;

/// A column actually present in a model's table.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaColumn {
    pub name: String,
    pub type_name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub default: Value,
    pub limit: Option<i64>,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
    /// Adapter-specific attributes for custom types.
    pub extra: BTreeMap<String, Value>,
}

impl SchemaColumn {
    /// A nullable column with no default and no size attributes.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            sql_type: type_name.clone(),
            type_name,
            nullable: true,
            default: Value::Nil,
            limit: None,
            precision: None,
            scale: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_precision(mut self, precision: i64, scale: i64) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// The column's value for a declaration attribute name.
    ///
    /// Unknown attribute names fall back to `extra`, then to nil.
    pub fn attribute(&self, key: &str) -> Value {
        match key {
            "default" => self.default.clone(),
            "null" => Value::Bool(self.nullable),
            "limit" => self.limit.into(),
            "precision" => self.precision.into(),
            "scale" => self.scale.into(),
            other => self.extra.get(other).cloned().unwrap_or_default(),
        }
    }
}

/// A `belongs_to` association whose foreign key lives in the model's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDescriptor {
    pub name: String,
    pub foreign_key: String,
    pub polymorphic: bool,
    pub foreign_type: Option<String>,
}

impl AssociationDescriptor {
    pub fn new(name: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            foreign_key: foreign_key.into(),
            polymorphic: false,
            foreign_type: None,
        }
    }

    pub fn polymorphic(mut self, foreign_type: Option<String>) -> Self {
        self.polymorphic = true;
        self.foreign_type = foreign_type;
        self
    }

    /// Columns backing this association: the foreign key, plus the type
    /// discriminator of a polymorphic association.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![self.foreign_key.clone()];
        if self.polymorphic {
            let discriminator = self.foreign_type.clone().unwrap_or_else(|| {
                match self.foreign_key.strip_suffix("_id") {
                    Some(stem) => format!("{stem}_type"),
                    None => format!("{}_type", self.foreign_key),
                }
            });
            columns.push(discriminator);
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_attributes() {
        let column = SchemaColumn::new("code", "string").with_limit(4).not_null();
        assert_eq!(column.attribute("limit"), Value::Integer(4));
        assert_eq!(column.attribute("null"), Value::Bool(false));
        assert_eq!(column.attribute("default"), Value::Nil);
        assert_eq!(column.attribute("srid"), Value::Nil);
    }

    #[test]
    fn test_plain_association_columns() {
        let association = AssociationDescriptor::new("author", "author_id");
        assert_eq!(association.columns(), vec!["author_id"]);
    }

    #[test]
    fn test_polymorphic_association_derives_type_column() {
        let association = AssociationDescriptor::new("owner", "owner_id").polymorphic(None);
        assert_eq!(association.columns(), vec!["owner_id", "owner_type"]);
    }

    #[test]
    fn test_polymorphic_association_explicit_type_column() {
        let association = AssociationDescriptor::new("owner", "owner_id")
            .polymorphic(Some("owner_kind".to_string()));
        assert_eq!(association.columns(), vec!["owner_id", "owner_kind"]);
    }
}
