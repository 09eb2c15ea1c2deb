//! Plugin Trait System
//!
//! The seams between the host and plugin modules. The registry and the
//! route composer only see these traits; how a module got into the process
//! is the loader's business.

use crate::plugin::error::{BoxError, PluginResult};
use crate::plugin::reference::PluginReference;
use crate::plugin::types::{Export, InitEntry};
use crate::routing::handler::Handler;
use std::path::Path;

/// A module loaded into the process
pub trait PluginModule: Send + Sync {
    /// Handler exported under `symbol`
    fn handler(&self, symbol: &str) -> Option<Handler>;

    /// Value exported under `symbol` for other plugins
    fn export(&self, symbol: &str) -> Option<Export>;

    /// The optional `OnInit` entry point
    fn on_init(&self) -> Option<InitEntry>;

    /// Release module resources; called once when the registry closes
    fn close(&self) -> Result<(), BoxError>;
}

/// Turns a plugin reference into a loaded module
pub trait ModuleLoader: Send + Sync {
    /// Load the module for `reference`, looking for artifacts under
    /// `storage_dir`. With `update` set the loader refreshes the stored
    /// artifact first where it knows how.
    fn load(
        &self,
        reference: &PluginReference,
        storage_dir: &Path,
        update: bool,
    ) -> PluginResult<Box<dyn PluginModule>>;
}

/// Capability handed to plugins during initialization
pub trait Plugins {
    /// Canonical names in load order
    fn names(&self) -> Vec<String>;

    fn has(&self, plugin: &str) -> bool;

    fn handler(&self, plugin: &str, symbol: &str) -> PluginResult<Handler>;

    fn export(&self, plugin: &str, symbol: &str) -> PluginResult<Export>;
}
