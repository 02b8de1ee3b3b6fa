//! Migration text that would bring the table in line with the declarations

use std::fmt;

use fieldsync_meta::{FieldDeclaration, Registry};

use crate::diff::DiffResult;

/// Accumulated `up` and `down` migration statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Migration {
    pub up: String,
    pub down: String,
}

/// `:name`, quoted when the name is not a plain identifier.
fn symbol(name: &str) -> String {
    let plain = name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain {
        format!(":{name}")
    } else {
        format!(":\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

fn push_line(buffer: &mut String, line: &str) {
    buffer.push_str(line);
    buffer.push('\n');
}

/// `, :key=>value` for every attribute, in key order.
fn attribute_list(field: &FieldDeclaration) -> String {
    field
        .attributes
        .iter()
        .map(|(key, value)| format!(", {}=>{value}", symbol(key)))
        .collect()
}

impl Migration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements for one model's diff.
    ///
    /// `declared` supplies the declared shape of modified fields, which the
    /// `up` direction changes columns to. Every declaration passes through
    /// the registry's migration hooks before it is written.
    pub fn for_model(table: &str, diff: &DiffResult, declared: &[FieldDeclaration], registry: &Registry) -> Self {
        let mut migration = Self::new();
        if diff.is_empty() {
            return migration;
        }
        let table = symbol(table);
        let up = &mut migration.up;
        let down = &mut migration.down;
        up.push('\n');
        down.push('\n');

        if diff.model_deleted && diff.modified_fields.is_empty() && diff.new_fields.is_empty() {
            push_line(up, &format!("  create_table {table} do |t|"));
            for field in &diff.deleted_fields {
                let field = registry.adjust_for_migration(field);
                push_line(up, &format!("    t.{} {}{}", field.type_name, symbol(&field.name), attribute_list(&field)));
            }
            push_line(up, "  end");
            push_line(down, &format!("  drop_table {table}"));
            return migration;
        }

        for field in &diff.deleted_fields {
            let field = registry.adjust_for_migration(field);
            let name = symbol(&field.name);
            push_line(up, &format!("  add_column {table}, {name}, {}{}", symbol(&field.type_name), attribute_list(&field)));
            push_line(down, &format!("  remove_column {table}, {name}"));
        }
        for field in &diff.modified_fields {
            let from_schema = registry.adjust_for_migration(field);
            let to_declared = declared
                .iter()
                .find(|d| d.name == field.name)
                .map(|d| registry.adjust_for_migration(d))
                .unwrap_or_else(|| from_schema.clone());
            push_line(
                up,
                &format!(
                    "  change_column {table}, {}, {}{}",
                    symbol(&to_declared.name),
                    symbol(&to_declared.type_name),
                    attribute_list(&to_declared),
                ),
            );
            push_line(
                down,
                &format!(
                    "  change_column {table}, {}, {}{}",
                    symbol(&from_schema.name),
                    symbol(&from_schema.type_name),
                    attribute_list(&from_schema),
                ),
            );
        }
        for field in &diff.new_fields {
            let field = registry.adjust_for_migration(field);
            let name = symbol(&field.name);
            push_line(up, &format!("  remove_column {table}, {name}"));
            push_line(down, &format!("  add_column {table}, {name}, {}{}", symbol(&field.type_name), attribute_list(&field)));
        }
        migration
    }

    /// Append another model's statements.
    pub fn append(&mut self, other: Migration) {
        self.up.push_str(&other.up);
        self.down.push_str(&other.down);
    }

    pub fn is_empty(&self) -> bool {
        self.up.trim().is_empty() && self.down.trim().is_empty()
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.up.trim().is_empty() {
            writeln!(f, "\n# up:")?;
            f.write_str(&self.up)?;
        }
        if !self.down.trim().is_empty() {
            writeln!(f, "\n# down:")?;
            f.write_str(&self.down)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldsync_meta::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_diff_gives_nothing() {
        let migration = Migration::for_model("books", &DiffResult::default(), &[], &Registry::with_builtins());
        assert!(migration.is_empty());
        assert_eq!(migration.to_string(), "");
    }

    #[test]
    fn test_missing_table_is_created() {
        let diff = DiffResult {
            deleted_fields: vec![
                FieldDeclaration::new("title", "string"),
                FieldDeclaration::new("code", "string").with_attribute("limit", 4i64),
            ],
            model_deleted: true,
            ..Default::default()
        };
        let migration = Migration::for_model("books", &diff, &diff.deleted_fields, &Registry::with_builtins());
        assert_eq!(
            migration.up,
            "\n  create_table :books do |t|\n    t.string :title\n    t.string :code, :limit=>4\n  end\n"
        );
        assert_eq!(migration.down, "\n  drop_table :books\n");
    }

    #[test]
    fn test_column_changes() {
        let declared = vec![
            FieldDeclaration::new("price", "decimal")
                .with_attribute("precision", 10i64)
                .with_attribute("scale", 2i64),
            FieldDeclaration::new("nationality", "string"),
        ];
        let diff = DiffResult {
            new_fields: vec![FieldDeclaration::new("number", "integer")],
            modified_fields: vec![
                FieldDeclaration::new("price", "decimal")
                    .with_attribute("precision", 8i64)
                    .with_attribute("scale", 2i64),
            ],
            deleted_fields: vec![declared[1].clone()],
            model_deleted: false,
        };
        let migration = Migration::for_model("authors", &diff, &declared, &Registry::with_builtins());
        assert_eq!(
            migration.up,
            "\n  add_column :authors, :nationality, :string\n  change_column :authors, :price, :decimal, :precision=>10, :scale=>2\n  remove_column :authors, :number\n"
        );
        assert_eq!(
            migration.down,
            "\n  remove_column :authors, :nationality\n  change_column :authors, :price, :decimal, :precision=>8, :scale=>2\n  add_column :authors, :number, :integer\n"
        );
    }

    #[test]
    fn test_migration_hooks_adjust_declarations() {
        let mut registry = Registry::with_builtins();
        registry.register_migration_hook(
            "string",
            Box::new(|field| {
                field.attributes.insert("null".into(), Value::Bool(false));
            }),
        );
        let diff = DiffResult {
            deleted_fields: vec![FieldDeclaration::new("title", "string")],
            ..Default::default()
        };
        let migration = Migration::for_model("books", &diff, &[], &registry);
        assert_eq!(migration.up, "\n  add_column :books, :title, :string, :null=>false\n");
    }

    #[test]
    fn test_render_sections() {
        let mut migration = Migration::new();
        migration.append(Migration {
            up: "\n  remove_column :books, :isbn\n".into(),
            down: "\n  add_column :books, :isbn, :string\n".into(),
        });
        assert_eq!(
            migration.to_string(),
            "\n# up:\n\n  remove_column :books, :isbn\n\n# down:\n\n  add_column :books, :isbn, :string\n"
        );
    }

    #[test]
    fn test_symbol_quoting() {
        assert_eq!(symbol("created_at"), ":created_at");
        assert_eq!(symbol("sub title"), ":\"sub title\"");
    }
}
