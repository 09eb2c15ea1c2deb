//! Configuration Error Types

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("error reading configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing configuration file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("malformed handler reference \"{reference}\": {reason}")]
    MalformedHandlerRef { reference: String, reason: String },

    #[error("group #{index} has no name")]
    EmptyGroupName { index: usize },

    #[error("group \"{name}\" is declared more than once")]
    DuplicateGroup { name: String },

    #[error("{referenced_by} references unknown group \"{name}\"")]
    UnknownGroup { name: String, referenced_by: String },
}

impl ConfigError {
    pub(crate) fn malformed(reference: &str, reason: &str) -> Self {
        ConfigError::MalformedHandlerRef {
            reference: reference.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
