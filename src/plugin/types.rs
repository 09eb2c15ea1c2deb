//! Plugin data structures
//!
//! What a module hands the host when it is loaded: its handlers, its
//! exports for other plugins, an optional `OnInit` entry and an optional
//! close hook.

use crate::config::api::{Environment, Flags};
use crate::plugin::error::BoxError;
use crate::plugin::traits::{PluginModule, Plugins};
use crate::routing::handler::{Context, Handler, Response};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Value a plugin shares with other plugins by name
pub type Export = Arc<dyn Any + Send + Sync>;

/// Initializer taking the registry, flags and environment
pub type InitWithFlags = fn(&dyn Plugins, &Flags, &Environment) -> Result<(), BoxError>;

/// Initializer taking the registry and environment only
pub type InitWithEnv = fn(&dyn Plugins, &Environment) -> Result<(), BoxError>;

/// Hook run when the registry is closed
pub type CloseHook = Box<dyn Fn() -> Result<(), BoxError> + Send + Sync>;

/// Shape tag for [`InitWithFlags`]
pub const INIT_SHAPE_FLAGS_AND_ENV: u32 = 1;
/// Shape tag for [`InitWithEnv`]
pub const INIT_SHAPE_ENV_ONLY: u32 = 2;

/// The `OnInit` entry point as exported by a plugin.
///
/// `shape` says which slot is populated. The host only calls a slot whose
/// tag it recognises.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct InitEntry {
    pub shape: u32,
    pub with_flags: Option<InitWithFlags>,
    pub env_only: Option<InitWithEnv>,
}

impl InitEntry {
    pub const fn flags_and_env(func: InitWithFlags) -> Self {
        Self {
            shape: INIT_SHAPE_FLAGS_AND_ENV,
            with_flags: Some(func),
            env_only: None,
        }
    }

    pub const fn env_only(func: InitWithEnv) -> Self {
        Self {
            shape: INIT_SHAPE_ENV_ONLY,
            with_flags: None,
            env_only: Some(func),
        }
    }
}

impl fmt::Debug for InitEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitEntry")
            .field("shape", &self.shape)
            .field("with_flags", &self.with_flags.is_some())
            .field("env_only", &self.env_only.is_some())
            .finish()
    }
}

/// Collects what a plugin module provides while it registers itself
#[derive(Default)]
pub struct PluginRegistrar {
    handlers: HashMap<String, Handler>,
    exports: HashMap<String, Export>,
    on_init: Option<InitEntry>,
    on_close: Option<CloseHook>,
}

impl PluginRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request handler under `symbol`
    pub fn handler<F>(&mut self, symbol: &str, func: F) -> &mut Self
    where
        F: Fn(&mut Context) -> Option<Response> + Send + Sync + 'static,
    {
        if self
            .handlers
            .insert(symbol.to_string(), Handler::new(func))
            .is_some()
        {
            log::warn!("Handler '{}' registered twice; keeping the last", symbol);
        }
        self
    }

    /// Share a value with other plugins under `symbol`
    pub fn export<T: Any + Send + Sync>(&mut self, symbol: &str, value: T) -> &mut Self {
        self.exports.insert(symbol.to_string(), Arc::new(value));
        self
    }

    pub fn on_init(&mut self, entry: InitEntry) -> &mut Self {
        self.on_init = Some(entry);
        self
    }

    pub fn on_close<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_close = Some(Box::new(hook));
        self
    }

    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn into_table(self) -> ModuleTable {
        ModuleTable {
            handlers: self.handlers,
            exports: self.exports,
            on_init: self.on_init,
            on_close: self.on_close,
        }
    }
}

/// Symbol table of a registered module
pub(crate) struct ModuleTable {
    handlers: HashMap<String, Handler>,
    exports: HashMap<String, Export>,
    on_init: Option<InitEntry>,
    on_close: Option<CloseHook>,
}

impl ModuleTable {
    /// Prefer an entry point found elsewhere (an exported `OnInit` symbol)
    pub(crate) fn set_on_init(&mut self, entry: Option<InitEntry>) {
        if entry.is_some() {
            self.on_init = entry;
        }
    }

    /// True while an export handed out by this table is still held elsewhere
    pub(crate) fn exports_in_use(&self) -> bool {
        self.exports.values().any(|e| Arc::strong_count(e) > 1)
    }
}

impl PluginModule for ModuleTable {
    fn handler(&self, symbol: &str) -> Option<Handler> {
        self.handlers.get(symbol).cloned()
    }

    fn export(&self, symbol: &str) -> Option<Export> {
        self.exports.get(symbol).cloned()
    }

    fn on_init(&self) -> Option<InitEntry> {
        self.on_init
    }

    fn close(&self) -> Result<(), BoxError> {
        match &self.on_close {
            Some(hook) => hook(),
            None => Ok(()),
        }
    }
}

/// Downcast an export to its concrete type
pub fn downcast_export<T: Any + Send + Sync>(export: Export) -> Option<Arc<T>> {
    export.downcast::<T>().ok()
}
