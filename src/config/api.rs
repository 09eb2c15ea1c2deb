//! Public API for configuration loading

pub use crate::config::error::{ConfigError, ConfigResult};
pub use crate::config::handler_ref::HandlerRef;
pub use crate::config::loader::{discover_config_path, CONFIG_FILE_NAME};
pub use crate::config::types::{
    Config, Environment, Flags, GroupDecl, RouteDecl, DEFAULT_PLUGIN_DIR,
};
