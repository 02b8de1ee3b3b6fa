//! Error types for fieldsync-core

/// Result type for fieldsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fieldsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown types, malformed declarations and hook failures
    #[error(transparent)]
    Meta(#[from] fieldsync_meta::Error),

    #[error(transparent)]
    Fs(#[from] fieldsync_fs::Error),

    /// No field block and no class declaration to put one after
    #[error("Model declaration not found")]
    ModelDeclarationNotFound,

    #[error("Invalid schema snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Model not found: {name}")]
    ModelNotFound { name: String },
}
