//! Type, alias and hook registry
//!
//! A `Registry` is populated once at startup (built-ins, then configuration,
//! then any programmatic hooks) and only read afterwards. It is passed
//! explicitly to the diff engine and the orchestrator; there is no global
//! instance.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::declaration::FieldDeclaration;
use crate::error::{BoxError, Error, Result};
use crate::schema::SchemaColumn;
use crate::value::Value;

/// Called with the model name and the declaration being declared.
pub type FieldHook =
    Box<dyn Fn(&str, &mut FieldDeclaration) -> std::result::Result<(), BoxError> + Send + Sync>;

/// Adjusts a declaration before it is rendered into migration text.
pub type MigrationHook = Box<dyn Fn(&mut FieldDeclaration) + Send + Sync>;

/// Replaces the default column -> declaration conversion.
pub type ColumnConversion =
    Box<dyn Fn(&SchemaColumn) -> std::result::Result<FieldDeclaration, BoxError> + Send + Sync>;

/// Attributes every type accepts, merged under each registered definition.
const COMMON_ATTRIBUTES: [(&str, Value); 2] = [("default", Value::Nil), ("null", Value::Bool(true))];

const NO_EXTRA_ATTRIBUTES: [(&str, Value); 0] = [];

/// Default attribute values of one field type.
///
/// The key set doubles as the list of attributes that are compared when a
/// declaration is checked against a column of this type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeDefinition {
    defaults: BTreeMap<String, Value>,
}

impl TypeDefinition {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.defaults.keys().map(String::as_str)
    }

    pub fn default_for(&self, key: &str) -> Option<&Value> {
        self.defaults.get(key)
    }

    pub fn defaults(&self) -> &BTreeMap<String, Value> {
        &self.defaults
    }

    /// True if `value` is exactly this type's default for `key`.
    pub fn is_default(&self, key: &str, value: &Value) -> bool {
        self.defaults.get(key) == Some(value)
    }
}

/// Process-wide field configuration.
#[derive(Default)]
pub struct Registry {
    types: HashMap<String, TypeDefinition>,
    aliases: HashMap<String, String>,
    hooks: HashMap<String, FieldHook>,
    all_fields_hook: Option<FieldHook>,
    migration_hooks: HashMap<String, MigrationHook>,
    column_conversion: Option<ColumnConversion>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut hooked: Vec<&String> = self.hooks.keys().collect();
        hooked.sort();
        f.debug_struct("Registry")
            .field("types", &self.list_types())
            .field("aliases", &self.aliases)
            .field("hooks", &hooked)
            .field("all_fields_hook", &self.all_fields_hook.is_some())
            .field("migration_hooks", &self.migration_hooks.len())
            .field("column_conversion", &self.column_conversion.is_some())
            .finish()
    }
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the standard column types registered.
    ///
    /// Every type also accepts `default` (nil) and `null` (true).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_type("string", [("limit", Value::Integer(255))]);
        registry.register_type("text", [("limit", Value::Nil)]);
        registry.register_type("integer", [("limit", Value::Nil)]);
        registry.register_type("float", NO_EXTRA_ATTRIBUTES);
        registry.register_type("decimal", [("scale", Value::Nil), ("precision", Value::Nil)]);
        registry.register_type("datetime", NO_EXTRA_ATTRIBUTES);
        registry.register_type("time", NO_EXTRA_ATTRIBUTES);
        registry.register_type("date", NO_EXTRA_ATTRIBUTES);
        registry.register_type("binary", [("limit", Value::Nil)]);
        registry.register_type("boolean", NO_EXTRA_ATTRIBUTES);
        registry.register_alias("timestamp", "datetime");
        registry
    }

    /// Register a field type with its default attribute values.
    ///
    /// Replaces any earlier definition of the same type.
    pub fn register_type<I, K>(&mut self, name: impl Into<String>, defaults: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut merged: BTreeMap<String, Value> = COMMON_ATTRIBUTES
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        merged.extend(defaults.into_iter().map(|(k, v)| (k.into(), v)));
        self.types
            .insert(name.into(), TypeDefinition { defaults: merged });
    }

    /// Make `alias` compare equal to `canonical` when types are diffed.
    pub fn register_alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(alias.into(), canonical.into());
    }

    /// Hook run whenever a field of `type_name` is declared.
    pub fn register_hook(&mut self, type_name: impl Into<String>, hook: FieldHook) {
        self.hooks.insert(type_name.into(), hook);
    }

    /// Hook run for every declared field, after the type-specific hook.
    pub fn register_all_fields_hook(&mut self, hook: FieldHook) {
        self.all_fields_hook = Some(hook);
    }

    /// Hook adjusting declarations of `type_name` before migration rendering.
    pub fn register_migration_hook(&mut self, type_name: impl Into<String>, hook: MigrationHook) {
        self.migration_hooks.insert(type_name.into(), hook);
    }

    /// Override how schema columns become declarations.
    pub fn set_column_conversion(&mut self, conversion: ColumnConversion) {
        self.column_conversion = Some(conversion);
    }

    /// Look up a registered type. This is where unknown types are rejected.
    pub fn lookup_type(&self, name: &str) -> Result<&TypeDefinition> {
        self.types.get(name).ok_or_else(|| Error::UnknownType {
            type_name: name.to_string(),
        })
    }

    /// Resolve a type name through the alias table.
    ///
    /// Aliases are resolved one level only; an alias of an alias is not
    /// followed.
    pub fn canonical_type<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Registered type names, sorted.
    pub fn list_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Validate and canonicalize a declaration made in `model`.
    ///
    /// Runs the type hook and then the all-fields hook, rejects unknown
    /// types, and drops attributes equal to the type's default.
    pub fn declare(&self, model: &str, declaration: FieldDeclaration) -> Result<FieldDeclaration> {
        let mut declaration = declaration;

        let type_hook = self.hooks.get(&declaration.type_name);
        for hook in type_hook.into_iter().chain(self.all_fields_hook.as_ref()) {
            hook(model, &mut declaration).map_err(|source| Error::Hook {
                field: declaration.name.clone(),
                source,
            })?;
        }

        let definition = self.lookup_type(self.canonical_type(&declaration.type_name))?;
        declaration
            .attributes
            .retain(|key, value| !definition.is_default(key, value));

        tracing::trace!(model, field = %declaration, "declared field");
        Ok(declaration)
    }

    /// Convert a schema column into the declaration that describes it.
    ///
    /// Without a custom conversion, every attribute of the column's type
    /// whose column value differs from the type default is copied.
    pub fn column_to_declaration(&self, column: &SchemaColumn) -> Result<FieldDeclaration> {
        if let Some(conversion) = &self.column_conversion {
            return conversion(column).map_err(|source| Error::Hook {
                field: column.name.clone(),
                source,
            });
        }

        let definition = self.lookup_type(self.canonical_type(&column.type_name))?;
        let mut declaration = FieldDeclaration::new(&column.name, &column.type_name);
        for (key, default) in definition.defaults() {
            let value = column.attribute(key);
            if value != *default {
                declaration.attributes.insert(key.clone(), value);
            }
        }
        Ok(declaration)
    }

    /// Copy of `declaration` as adjusted by its type's migration hook.
    pub fn adjust_for_migration(&self, declaration: &FieldDeclaration) -> FieldDeclaration {
        let mut adjusted = declaration.clone();
        if let Some(hook) = self.migration_hooks.get(&declaration.type_name) {
            hook(&mut adjusted);
        }
        adjusted
    }
}
