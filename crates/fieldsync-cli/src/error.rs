//! Error types for fieldsync-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from fieldsync-core
    #[error(transparent)]
    Core(#[from] fieldsync_core::Error),

    /// Error from fieldsync-meta (configuration, registry)
    #[error(transparent)]
    Meta(#[from] fieldsync_meta::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
