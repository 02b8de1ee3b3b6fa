//! Loading the configuration and models a command works on

use std::path::Path;

use fieldsync_core::{SchemaIntrospectable, SchemaSnapshot, SourceModel};
use fieldsync_meta::{Config, Registry};

use crate::cli::TargetArgs;
use crate::error::Result;

/// Everything a command needs: the registry built from configuration and
/// the models selected for this run.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub registry: Registry,
    pub models: Vec<SourceModel>,
}

impl Context {
    /// Load configuration, schema snapshot and model sources.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Explicit configuration file; otherwise
    ///   `fieldsync.toml` under the target root is used when present
    /// * `target` - Schema, root and model selection from the command line
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or snapshot cannot be read, a
    /// listed model file is missing, or a selected model is not in the
    /// snapshot.
    pub fn load(config_path: Option<&Path>, target: &TargetArgs) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load(path)?,
            None => Config::load_or_default(&target.root)?,
        };
        let registry = config.registry()?;
        tracing::debug!(
            policy = %config.core.primary_keys,
            types = registry.list_types().len(),
            "configuration loaded"
        );

        let models = SchemaSnapshot::load(&target.schema)?.into_models(&target.root)?;
        let models = select(models, &target.models)?;
        tracing::debug!(count = models.len(), "models loaded");

        Ok(Self {
            config,
            registry,
            models,
        })
    }
}

/// Keep only the named models, in snapshot order. An empty selection keeps
/// everything.
fn select(models: Vec<SourceModel>, names: &[String]) -> Result<Vec<SourceModel>> {
    if names.is_empty() {
        return Ok(models);
    }
    if let Some(missing) = names.iter().find(|name| !models.iter().any(|m| m.name() == name.as_str())) {
        return Err(fieldsync_core::Error::ModelNotFound { name: missing.clone() }.into());
    }
    Ok(models.into_iter().filter(|m| names.iter().any(|n| n == m.name())).collect())
}
