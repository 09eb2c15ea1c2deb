//! Service errors
//!
//! Each startup stage wraps the error of the module it drives, so the
//! message says which stage failed.

use crate::config::api::ConfigError;
use crate::core::error_handling::ContextualError;
use crate::plugin::api::PluginError;
use crate::routing::api::RoutingError;
use crate::server::api::ServerError;
use std::path::PathBuf;

/// Result type alias for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("error loading configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("error changing working directory to {dir}: {source}")]
    WorkingDirectory {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error creating directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error opening panic log: {0}")]
    OpenPanicLog(#[source] ServerError),

    #[error("error loading plugins: {0}")]
    LoadPlugins(#[source] PluginError),

    #[error("error initializing plugins: {0}")]
    InitPlugins(#[source] PluginError),

    #[error("error initializing groups: {0}")]
    InitGroups(#[source] RoutingError),

    #[error("error initializing routes: {0}")]
    InitRoutes(#[source] RoutingError),

    #[error("error building router: {0}")]
    BuildRouter(#[source] RoutingError),

    #[error("listener terminated: {0}")]
    Listen(#[source] ServerError),

    #[error("error closing plugins: {0}")]
    ClosePlugins(#[source] PluginError),

    #[error("error closing panic log: {0}")]
    ClosePanicLog(#[source] ServerError),

    #[error("service is already closed")]
    AlreadyClosed,

    /// Every failure seen while closing
    #[error("{}", join_errors(.errors))]
    Shutdown { errors: Vec<ServiceError> },
}

fn join_errors(errors: &[ServiceError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ContextualError for ServiceError {
    fn is_user_actionable(&self) -> bool {
        match self {
            ServiceError::Config(_)
            | ServiceError::LoadPlugins(_)
            | ServiceError::InitPlugins(_)
            | ServiceError::InitGroups(_)
            | ServiceError::InitRoutes(_)
            | ServiceError::BuildRouter(_)
            | ServiceError::AlreadyClosed => true,
            ServiceError::Listen(e) => matches!(
                e,
                ServerError::InvalidTlsDirectory { .. } | ServerError::TlsConfig { .. }
            ),
            ServiceError::Shutdown { errors } => errors.iter().all(|e| e.is_user_actionable()),
            _ => false,
        }
    }

    fn user_message(&self) -> Option<String> {
        if self.is_user_actionable() {
            Some(self.to_string())
        } else {
            None
        }
    }
}
