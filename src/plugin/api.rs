//! Public API for the plugin system
//!
//! Everything a host embedding plugserve or a plugin author needs. Plugin
//! crates normally `use plugserve::plugin::api::*;`.

// Loading and registry
pub use crate::plugin::builtin::{BuiltinLoader, ModuleFactory};
pub use crate::plugin::loader::DylibLoader;
pub use crate::plugin::registry::{LoadedPlugin, PluginRegistry};
pub use crate::plugin::traits::{ModuleLoader, PluginModule, Plugins};

// References and activation
pub use crate::plugin::activation::{RequireFilter, REQUIRE_FLAG};
pub use crate::plugin::reference::{canonical_name, PluginReference};

// Initialization
pub use crate::plugin::initialization::{initialize_plugins, Initializer};

// Module authoring
pub use crate::plugin::abi::{
    ApiVersionFn, RegisterFn, API_VERSION_SYMBOL, ON_INIT_SYMBOL, REGISTER_SYMBOL,
};
pub use crate::plugin::types::{
    downcast_export, CloseHook, Export, InitEntry, InitWithEnv, InitWithFlags, PluginRegistrar,
    INIT_SHAPE_ENV_ONLY, INIT_SHAPE_FLAGS_AND_ENV,
};

// Error handling
pub use crate::plugin::error::{BoxError, PluginError, PluginResult};

// Types handlers and initializers work with
pub use crate::config::api::{Environment, Flags};
pub use crate::routing::api::{Context, Handler, Response};
pub use axum::http::{Method, StatusCode};
