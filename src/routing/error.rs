//! Routing error types

use crate::plugin::api::PluginError;

/// Result type alias for routing operations
pub type RoutingResult<T> = std::result::Result<T, RoutingError>;

#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// A handler reference did not resolve against the registry
    #[error(transparent)]
    Handler(#[from] PluginError),

    /// The router engine rejected a path
    #[error("invalid route path \"{path}\": {reason}")]
    InvalidPath { path: String, reason: String },

    /// Method and path are already registered
    #[error("route {method} {path} is already registered")]
    DuplicateRoute { method: String, path: String },

    #[error("group \"{name}\" is not declared")]
    GroupNotFound { name: String },

    /// Groups naming each other as parents
    #[error("group \"{name}\" is its own ancestor")]
    GroupCycle { name: String },

    #[error("error initializing group \"{name}\": {source}")]
    GroupInit {
        name: String,
        #[source]
        source: Box<RoutingError>,
    },

    /// A route failed; `index` is its position in the configuration
    #[error("error initializing route #{index} ({route}): {source}")]
    RouteInit {
        index: usize,
        route: String,
        #[source]
        source: Box<RoutingError>,
    },

    /// Several routes failed
    #[error("{}", join_errors(.errors))]
    Routes { errors: Vec<RoutingError> },
}

impl RoutingError {
    /// Collapse a list of errors: none is `Ok`, one is itself, more are `Routes`
    pub fn from_list(mut errors: Vec<RoutingError>) -> RoutingResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(RoutingError::Routes { errors }),
        }
    }

    /// Configuration positions of the failing routes
    pub fn route_indices(&self) -> Vec<usize> {
        match self {
            RoutingError::RouteInit { index, .. } => vec![*index],
            RoutingError::Routes { errors } => {
                errors.iter().flat_map(|e| e.route_indices()).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn join_errors(errors: &[RoutingError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
