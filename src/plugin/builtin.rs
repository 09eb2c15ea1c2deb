//! Built-in plugin modules
//!
//! Modules compiled into the host process, registered by canonical name.
//! Embedders use these to ship handlers without a shared library; the
//! update flag has no meaning for them.

use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::reference::PluginReference;
use crate::plugin::traits::{ModuleLoader, PluginModule};
use crate::plugin::types::PluginRegistrar;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Builds a fresh registrar each time the module is loaded
pub type ModuleFactory = Arc<dyn Fn() -> PluginRegistrar + Send + Sync>;

/// Loader for in-process modules
#[derive(Clone, Default)]
pub struct BuiltinLoader {
    factories: HashMap<String, ModuleFactory>,
}

impl BuiltinLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_module<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> PluginRegistrar + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> PluginRegistrar + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl std::fmt::Debug for BuiltinLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("BuiltinLoader").field("modules", &names).finish()
    }
}

impl ModuleLoader for BuiltinLoader {
    fn load(
        &self,
        reference: &PluginReference,
        _storage_dir: &Path,
        update: bool,
    ) -> PluginResult<Box<dyn PluginModule>> {
        let name = reference.canonical_name();
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| PluginError::LoadError {
                plugin_name: name.to_string(),
                cause: "no built-in module with this name".to_string(),
            })?;

        if update {
            log::debug!("Built-in plugin '{}' has no artifact to update", name);
        }
        Ok(Box::new(factory().into_table()))
    }
}
