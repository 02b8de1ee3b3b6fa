//! Error types for fieldsync-meta

/// Result type for fieldsync-meta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type returned by user-supplied hooks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in fieldsync-meta operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Field type {type_name} not defined")]
    UnknownType { type_name: String },

    #[error("Invalid field declaration `{line}`: {message}")]
    InvalidDeclaration { line: String, message: String },

    #[error("Invalid decimal literal: {literal}")]
    InvalidDecimal { literal: String },

    #[error("Hook failed for field {field}")]
    Hook {
        field: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn declaration(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            line: line.into(),
            message: message.into(),
        }
    }
}
