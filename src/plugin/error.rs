//! Plugin Error Handling
//!
//! Error types for plugin reference parsing, loading, lookup, initialization
//! and teardown.

/// Boxed error returned by plugin entry points
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for plugin operations
pub type PluginResult<T> = std::result::Result<T, PluginError>;

/// Error types for plugin system operations
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Plugin not found in registry
    #[error("Plugin not found: {plugin_name}")]
    PluginNotFound { plugin_name: String },

    /// Two references resolved to the same canonical name
    #[error("Plugin '{plugin_name}' is already loaded (duplicate reference \"{reference}\")")]
    DuplicatePlugin {
        plugin_name: String,
        reference: String,
    },

    /// Plugin reference string could not be parsed
    #[error("Invalid plugin reference \"{reference}\": {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Plugin artifact is missing or could not be loaded
    #[error("Failed to load plugin '{plugin_name}': {cause}")]
    LoadError { plugin_name: String, cause: String },

    /// Plugin API version incompatible with the host
    #[error("Version incompatible: {message}")]
    VersionIncompatible { message: String },

    /// Plugin does not export the requested handler
    #[error("Plugin '{plugin_name}' has no handler '{symbol}'")]
    HandlerNotFound { plugin_name: String, symbol: String },

    /// Plugin does not export the requested value
    #[error("Plugin '{plugin_name}' has no export '{symbol}'")]
    ExportNotFound { plugin_name: String, symbol: String },

    /// `OnInit` entry point has a shape the host does not support
    #[error("unsupported initialization func encountered in plugin '{plugin_name}' (shape {shape})")]
    UnsupportedInitSignature { plugin_name: String, shape: u32 },

    /// `OnInit` entry point returned an error
    #[error("error initializing {plugin_name}: {source}")]
    InitFailed {
        plugin_name: String,
        #[source]
        source: BoxError,
    },

    /// Close hook returned an error
    #[error("error closing {plugin_name}: {source}")]
    CloseFailed {
        plugin_name: String,
        #[source]
        source: BoxError,
    },

    /// Registry has already been closed
    #[error("plugin registry is already closed")]
    RegistryClosed,

    /// Filesystem failure while preparing plugin artifacts
    #[error("IO error during {operation} on {path}: {source}")]
    IoError {
        operation: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Several independent failures, e.g. while closing every plugin
    #[error("{}", join_errors(.errors))]
    Multiple { errors: Vec<PluginError> },
}

impl PluginError {
    /// Collapse a list of errors: none is `Ok`, one is itself, more are `Multiple`
    pub fn from_list(mut errors: Vec<PluginError>) -> PluginResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(PluginError::Multiple { errors }),
        }
    }

    pub(crate) fn io(operation: &str, path: &std::path::Path, source: std::io::Error) -> Self {
        PluginError::IoError {
            operation: operation.to_string(),
            path: path.display().to_string(),
            source,
        }
    }
}

fn join_errors(errors: &[PluginError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
