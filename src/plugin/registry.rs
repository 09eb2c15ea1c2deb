//! Plugin Registry
//!
//! Loaded plugins keyed by canonical name. The registry is filled during the
//! single-threaded load phase and only read afterwards, so lookups take no
//! locks. The one post-startup mutation is the closed flag.

use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::reference::PluginReference;
use crate::plugin::traits::{ModuleLoader, PluginModule, Plugins};
use crate::plugin::types::Export;
use crate::routing::handler::Handler;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// A plugin module together with the name it is registered under
pub struct LoadedPlugin {
    name: String,
    reference: PluginReference,
    module: Box<dyn PluginModule>,
}

impl LoadedPlugin {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> &PluginReference {
        &self.reference
    }

    pub fn module(&self) -> &dyn PluginModule {
        self.module.as_ref()
    }

    pub fn handler(&self, symbol: &str) -> PluginResult<Handler> {
        self.module
            .handler(symbol)
            .ok_or_else(|| PluginError::HandlerNotFound {
                plugin_name: self.name.clone(),
                symbol: symbol.to_string(),
            })
    }

    pub fn export(&self, symbol: &str) -> PluginResult<Export> {
        self.module
            .export(symbol)
            .ok_or_else(|| PluginError::ExportNotFound {
                plugin_name: self.name.clone(),
                symbol: symbol.to_string(),
            })
    }
}

impl std::fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("name", &self.name)
            .field("reference", &self.reference.as_str())
            .finish()
    }
}

/// Plugin registry for managing loaded plugins
pub struct PluginRegistry {
    loader: Box<dyn ModuleLoader>,
    storage_dir: PathBuf,
    update: bool,
    plugins: HashMap<String, LoadedPlugin>,
    /// Canonical names in load order
    order: Vec<String>,
    closed: AtomicBool,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("storage_dir", &self.storage_dir)
            .field("update", &self.update)
            .field("plugins", &self.order)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new(loader: Box<dyn ModuleLoader>, storage_dir: impl Into<PathBuf>, update: bool) -> Self {
        Self {
            loader,
            storage_dir: storage_dir.into(),
            update,
            plugins: HashMap::new(),
            order: Vec::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Load a plugin and register it under its canonical name
    pub fn load(&mut self, reference: &PluginReference) -> PluginResult<String> {
        let name = reference.canonical_name().to_string();
        if let Some(existing) = self.plugins.get(&name) {
            return Err(PluginError::DuplicatePlugin {
                plugin_name: name,
                reference: format!("{} and {}", existing.reference, reference),
            });
        }

        log::debug!("Loading plugin '{}' from \"{}\"", name, reference);
        let module = self
            .loader
            .load(reference, &self.storage_dir, self.update)?;

        self.plugins.insert(
            name.clone(),
            LoadedPlugin {
                name: name.clone(),
                reference: reference.clone(),
                module,
            },
        );
        self.order.push(name.clone());
        log::info!("Loaded plugin '{}'", name);
        Ok(name)
    }

    /// Parse a reference string, then [`load`](Self::load) it
    pub fn load_str(&mut self, reference: &str) -> PluginResult<String> {
        let reference = PluginReference::parse(reference)?;
        self.load(&reference)
    }

    pub fn get(&self, name: &str) -> PluginResult<&LoadedPlugin> {
        self.plugins
            .get(name)
            .ok_or_else(|| PluginError::PluginNotFound {
                plugin_name: name.to_string(),
            })
    }

    /// Loaded plugins in load order
    pub fn iter(&self) -> impl Iterator<Item = &LoadedPlugin> {
        self.order.iter().filter_map(|name| self.plugins.get(name))
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Run every module's close hook, newest first, reporting all failures
    pub fn close(&self) -> PluginResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(PluginError::RegistryClosed);
        }

        let mut errors = Vec::new();
        for plugin in self.order.iter().rev().filter_map(|n| self.plugins.get(n)) {
            match plugin.module.close() {
                Ok(()) => log::debug!("Closed plugin '{}'", plugin.name),
                Err(source) => {
                    log::warn!("Plugin '{}' failed to close: {}", plugin.name, source);
                    errors.push(PluginError::CloseFailed {
                        plugin_name: plugin.name.clone(),
                        source,
                    });
                }
            }
        }
        PluginError::from_list(errors)
    }
}

impl Plugins for PluginRegistry {
    fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    fn has(&self, plugin: &str) -> bool {
        self.plugins.contains_key(plugin)
    }

    fn handler(&self, plugin: &str, symbol: &str) -> PluginResult<Handler> {
        self.get(plugin)?.handler(symbol)
    }

    fn export(&self, plugin: &str, symbol: &str) -> PluginResult<Export> {
        self.get(plugin)?.export(symbol)
    }
}
