//! Configuration types and loading for fieldsync
//!
//! This module provides types for loading and working with the optional
//! `fieldsync.toml` file. Every section has defaults, so an absent file
//! and an empty file behave the same.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::value::Value;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "fieldsync.toml";

/// Which primary-key columns appear as declared fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimaryKeyPolicy {
    /// Primary keys are never declared.
    #[default]
    Never,
    /// Every primary key is declared.
    Always,
    /// Only a primary key named `id` is declared.
    #[serde(alias = "only-id")]
    OnlyIfNamedId,
    /// Every primary key except one named `id` is declared.
    #[serde(alias = "except-id")]
    ExceptIfNamedId,
}

impl PrimaryKeyPolicy {
    /// The primary keys left out of every comparison under this policy.
    pub fn excluded<'a>(&self, primary_keys: &'a [String]) -> Vec<&'a str> {
        primary_keys
            .iter()
            .map(String::as_str)
            .filter(|pk| match self {
                PrimaryKeyPolicy::Never => true,
                PrimaryKeyPolicy::Always => false,
                PrimaryKeyPolicy::OnlyIfNamedId => *pk != "id",
                PrimaryKeyPolicy::ExceptIfNamedId => *pk == "id",
            })
            .collect()
    }
}

impl FromStr for PrimaryKeyPolicy {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "never" | "false" => Ok(PrimaryKeyPolicy::Never),
            "always" | "true" => Ok(PrimaryKeyPolicy::Always),
            "only-id" | "only-if-named-id" | "id" => Ok(PrimaryKeyPolicy::OnlyIfNamedId),
            "except-id" | "except-if-named-id" => Ok(PrimaryKeyPolicy::ExceptIfNamedId),
            _ => Err(Error::Config {
                message: format!("invalid primary key policy: {s}"),
            }),
        }
    }
}

impl fmt::Display for PrimaryKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKeyPolicy::Never => write!(f, "never"),
            PrimaryKeyPolicy::Always => write!(f, "always"),
            PrimaryKeyPolicy::OnlyIfNamedId => write!(f, "only-if-named-id"),
            PrimaryKeyPolicy::ExceptIfNamedId => write!(f, "except-if-named-id"),
        }
    }
}

/// `[core]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Primary key visibility
    #[serde(default)]
    pub primary_keys: PrimaryKeyPolicy,
    /// Write `<stem>_with_fields.<ext>` instead of overwriting models
    #[serde(default)]
    pub sibling_output: bool,
}

/// One `[[types]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeConfig {
    pub name: String,
    /// Attribute defaults
    #[serde(default)]
    pub defaults: BTreeMap<String, toml::Value>,
    /// Attributes whose default is nil
    #[serde(default)]
    pub optional: Vec<String>,
}

/// Parsed `fieldsync.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,
    /// alias -> canonical type
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub types: Vec<TypeConfig>,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Example
    ///
    /// ```
    /// use fieldsync_meta::{Config, PrimaryKeyPolicy};
    ///
    /// let config = Config::parse(r#"
    /// [core]
    /// primary_keys = "except-if-named-id"
    /// "#).unwrap();
    /// assert_eq!(config.core.primary_keys, PrimaryKeyPolicy::ExceptIfNamedId);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Self::parse(&content)
    }

    /// Load `fieldsync.toml` from `dir`, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Built-in registry extended with the configured types and aliases.
    pub fn registry(&self) -> Result<Registry> {
        let mut registry = Registry::with_builtins();
        for type_config in &self.types {
            let mut defaults = Vec::new();
            for name in &type_config.optional {
                defaults.push((name.clone(), Value::Nil));
            }
            for (name, value) in &type_config.defaults {
                defaults.push((name.clone(), toml_to_value(value)?));
            }
            registry.register_type(type_config.name.clone(), defaults);
        }
        for (alias, canonical) in &self.aliases {
            registry.register_alias(alias.clone(), canonical.clone());
        }
        Ok(registry)
    }
}

fn toml_to_value(value: &toml::Value) -> Result<Value> {
    match value {
        toml::Value::Boolean(b) => Ok(Value::Bool(*b)),
        toml::Value::Integer(i) => Ok(Value::Integer(*i)),
        toml::Value::Float(f) => Ok(Value::Float(*f)),
        toml::Value::String(s) => match s.strip_prefix(':') {
            Some(symbol) => Ok(Value::Symbol(symbol.to_string())),
            None => Ok(Value::String(s.clone())),
        },
        other => Err(Error::Config {
            message: format!("unsupported attribute default: {other}"),
        }),
    }
}
