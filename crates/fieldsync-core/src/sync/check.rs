//! Report types for the synchronizer

use std::fmt;
use std::path::PathBuf;

use fieldsync_meta::FieldDeclaration;
use serde::{Deserialize, Serialize};

use crate::diff::DiffResult;

/// Differences found for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    /// The model name
    pub model: String,
    /// Source file of the model, if known
    pub file: Option<PathBuf>,
    /// The model's table does not exist
    pub table_missing: bool,
    /// Canonical text of columns that have no declaration
    pub new_fields: Vec<String>,
    /// Canonical text of the schema's version of changed declarations
    pub modified_fields: Vec<String>,
    /// Canonical text of declarations without a column
    pub deleted_fields: Vec<String>,
}

impl ModelReport {
    pub fn new(model: impl Into<String>, file: Option<PathBuf>, diff: &DiffResult) -> Self {
        let texts = |fields: &[FieldDeclaration]| -> Vec<String> { fields.iter().map(|f| f.to_string()).collect() };
        Self {
            model: model.into(),
            file,
            table_missing: diff.model_deleted,
            new_fields: texts(&diff.new_fields),
            modified_fields: texts(&diff.modified_fields),
            deleted_fields: texts(&diff.deleted_fields),
        }
    }
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => writeln!(f, "{} ({}):", self.model, file.display())?,
            None => writeln!(f, "{}:", self.model)?,
        }
        if self.table_missing {
            writeln!(f, "  (table missing)")?;
        }
        for field in &self.new_fields {
            writeln!(f, "  + {field}")?;
        }
        for field in &self.modified_fields {
            writeln!(f, "  * {field}")?;
        }
        for field in &self.deleted_fields {
            writeln!(f, "  - {field}")?;
        }
        Ok(())
    }
}

/// A model that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFailure {
    pub model: String,
    pub file: Option<PathBuf>,
    /// Human-readable error
    pub error: String,
}

impl fmt::Display for ModelFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{} ({}): {}", self.model, file.display(), self.error),
            None => write!(f, "{}: {}", self.model, self.error),
        }
    }
}

/// Report from a check run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    /// Models whose declarations differ from the schema
    pub models: Vec<ModelReport>,
    /// Models skipped because their fields are omitted
    pub omitted: Vec<String>,
    pub failures: Vec<ModelFailure>,
}

impl CheckReport {
    /// True if every model is in sync and none failed
    pub fn is_clean(&self) -> bool {
        self.models.is_empty() && self.failures.is_empty()
    }
}

/// A rewritten (or, in a dry run, would-be rewritten) model file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub model: String,
    /// File that was written
    pub path: PathBuf,
    /// Unified diff from the original text to the new text
    pub diff: String,
}

/// Report from an update run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub changed: Vec<FileChange>,
    /// Models that needed no change
    pub unchanged: Vec<String>,
    pub failures: Vec<ModelFailure>,
    /// Nothing was written
    pub dry_run: bool,
}

impl UpdateReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
