//! Synchronizer implementation
//!
//! Each model is diffed and rewritten on its own. A model that fails is
//! recorded in the report and the run carries on with the rest.

use std::path::Path;

use fieldsync_meta::{FieldDeclaration, PrimaryKeyPolicy, Registry};
use similar::TextDiff;

use crate::Result;
use crate::block::{apply_diff, parse_block, render};
use crate::diff::{DiffResult, diff, diff_undeclared};
use crate::migration::Migration;
use crate::model::{DeclaredFields, SchemaIntrospectable};

use super::check::{CheckReport, FileChange, ModelFailure, ModelReport, UpdateReport};

/// Where `update` puts rewritten model files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Overwrite the model file
    #[default]
    InPlace,
    /// Write `<stem>_with_fields.<ext>` next to the model file
    Sibling,
    /// Compute the changes without writing anything
    DryRun,
}

/// A model's declarations together with their diff against the schema
struct ModelDiff {
    declared: Vec<FieldDeclaration>,
    diff: DiffResult,
}

/// Outcome of updating a single model
enum ModelUpdate {
    Omitted,
    Unchanged,
    Changed(FileChange),
}

fn failure<M: SchemaIntrospectable>(model: &M, error: &crate::Error) -> ModelFailure {
    tracing::warn!(model = model.name(), error = %error, "model failed");
    ModelFailure {
        model: model.name().to_string(),
        file: model.source_path().map(Path::to_path_buf),
        error: error.to_string(),
    }
}

fn unified_diff(original: &str, updated: &str, path: &Path) -> String {
    let label = path.display().to_string();
    TextDiff::from_lines(original, updated)
        .unified_diff()
        .context_radius(3)
        .header(&label, &label)
        .to_string()
}

/// Engine running check, update and migration over a set of models
///
/// The registry must be fully populated before the synchronizer is built;
/// it is only read from here on.
pub struct Synchronizer<'a> {
    registry: &'a Registry,
    policy: PrimaryKeyPolicy,
}

impl<'a> Synchronizer<'a> {
    /// Create a new Synchronizer
    ///
    /// # Arguments
    ///
    /// * `registry` - Types, aliases and hooks used to validate declarations
    /// * `policy` - Which primary keys are expected among the declarations
    pub fn new(registry: &'a Registry, policy: PrimaryKeyPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    pub fn policy(&self) -> PrimaryKeyPolicy {
        self.policy
    }

    /// Diff one model, or `None` if its fields are omitted.
    fn model_diff<M: SchemaIntrospectable>(&self, model: &M) -> Result<Option<ModelDiff>> {
        let columns = model.columns();
        let associations = model.belongs_to_associations();
        let primary_keys = model.primary_key_names();
        let (declared, diff) = match model.declared_fields(self.registry)? {
            DeclaredFields::Omitted => return Ok(None),
            DeclaredFields::Undeclared => {
                let diff = diff_undeclared(columns, associations, primary_keys, self.policy, self.registry)?;
                (Vec::new(), diff)
            }
            DeclaredFields::Fields(fields) => {
                let diff = diff(&fields, columns, associations, primary_keys, self.policy, self.registry)?;
                (fields, diff)
            }
        };
        Ok(Some(ModelDiff { declared, diff }))
    }

    /// Diff one model against its table.
    ///
    /// Returns `None` for a model whose fields are omitted.
    ///
    /// # Errors
    ///
    /// Returns an error if a declaration cannot be read or references an
    /// unknown type, or if a hook fails.
    pub fn diff_model<M: SchemaIntrospectable>(&self, model: &M) -> Result<Option<DiffResult>> {
        Ok(self.model_diff(model)?.map(|m| m.diff))
    }

    /// Report every model whose declarations differ from its table.
    ///
    /// Never touches the filesystem.
    pub fn check<M: SchemaIntrospectable>(&self, models: &[M]) -> CheckReport {
        let mut report = CheckReport::default();
        for model in models {
            match self.model_diff(model) {
                Ok(None) => report.omitted.push(model.name().to_string()),
                Ok(Some(ModelDiff { diff, .. })) if diff.is_empty() => {
                    tracing::debug!(model = model.name(), "model is in sync");
                }
                Ok(Some(ModelDiff { diff, .. })) => {
                    tracing::debug!(model = model.name(), changes = diff.change_count(), "model differs");
                    let file = model.source_path().map(Path::to_path_buf);
                    report.models.push(ModelReport::new(model.name(), file, &diff));
                }
                Err(e) => report.failures.push(failure(model, &e)),
            }
        }
        report
    }

    fn update_model<M: SchemaIntrospectable>(&self, model: &M, mode: WriteMode) -> Result<ModelUpdate> {
        let Some(ModelDiff { diff, .. }) = self.model_diff(model)? else {
            return Ok(ModelUpdate::Omitted);
        };
        if diff.is_empty() {
            return Ok(ModelUpdate::Unchanged);
        }
        let Some(path) = model.source_path() else {
            tracing::debug!(model = model.name(), "model has no source file; skipping");
            return Ok(ModelUpdate::Unchanged);
        };

        let original = fieldsync_fs::read_text(path)?;
        let block = parse_block(&original)?;
        let updated = render(&apply_diff(&block, &diff, model.primary_key_names()));
        if updated == original {
            return Ok(ModelUpdate::Unchanged);
        }

        let target = match mode {
            WriteMode::Sibling => fieldsync_fs::sibling_path(path),
            WriteMode::InPlace | WriteMode::DryRun => path.to_path_buf(),
        };
        if mode != WriteMode::DryRun {
            fieldsync_fs::write_text(&target, &updated)?;
            tracing::info!(model = model.name(), path = %target.display(), "updated field block");
        }
        Ok(ModelUpdate::Changed(FileChange {
            model: model.name().to_string(),
            diff: unified_diff(&original, &updated, &target),
            path: target,
        }))
    }

    /// Rewrite the field block of every model that differs from its table.
    ///
    /// Files whose rendered text is unchanged are not rewritten. Models
    /// without a source file are left alone.
    pub fn update<M: SchemaIntrospectable>(&self, models: &[M], mode: WriteMode) -> UpdateReport {
        let mut report = UpdateReport {
            dry_run: mode == WriteMode::DryRun,
            ..Default::default()
        };
        for model in models {
            match self.update_model(model, mode) {
                Ok(ModelUpdate::Omitted) => {}
                Ok(ModelUpdate::Unchanged) => report.unchanged.push(model.name().to_string()),
                Ok(ModelUpdate::Changed(change)) => report.changed.push(change),
                Err(e) => report.failures.push(failure(model, &e)),
            }
        }
        report
    }

    /// Migration text that would bring every table in line with its model.
    pub fn migration<M: SchemaIntrospectable>(&self, models: &[M]) -> (Migration, Vec<ModelFailure>) {
        let mut migration = Migration::new();
        let mut failures = Vec::new();
        for model in models {
            match self.model_diff(model) {
                Ok(Some(ModelDiff { declared, diff })) => {
                    migration.append(Migration::for_model(model.table_name(), &diff, &declared, self.registry));
                }
                Ok(None) => {}
                Err(e) => failures.push(failure(model, &e)),
            }
        }
        (migration, failures)
    }
}
