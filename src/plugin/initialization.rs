//! Plugin initialization
//!
//! Each loaded plugin may provide an `OnInit` entry point in one of two
//! shapes. Entries are matched against the supported shapes in a fixed order
//! and invoked in plugin declaration order; the first failure aborts.

use crate::config::api::{Environment, Flags};
use crate::plugin::error::{BoxError, PluginError, PluginResult};
use crate::plugin::reference::PluginReference;
use crate::plugin::registry::PluginRegistry;
use crate::plugin::traits::Plugins;
use crate::plugin::types::{
    InitEntry, InitWithEnv, InitWithFlags, INIT_SHAPE_ENV_ONLY, INIT_SHAPE_FLAGS_AND_ENV,
};

/// A supported initializer shape, matched from an [`InitEntry`]
#[derive(Clone, Copy)]
pub enum Initializer {
    FlagsAndEnv(InitWithFlags),
    EnvOnly(InitWithEnv),
}

impl Initializer {
    /// Match an entry against the supported shapes
    pub fn from_entry(plugin_name: &str, entry: &InitEntry) -> PluginResult<Self> {
        match (entry.shape, entry.with_flags, entry.env_only) {
            (INIT_SHAPE_FLAGS_AND_ENV, Some(func), _) => Ok(Initializer::FlagsAndEnv(func)),
            (INIT_SHAPE_ENV_ONLY, _, Some(func)) => Ok(Initializer::EnvOnly(func)),
            (shape, _, _) => Err(PluginError::UnsupportedInitSignature {
                plugin_name: plugin_name.to_string(),
                shape,
            }),
        }
    }

    pub fn invoke(
        &self,
        plugins: &dyn Plugins,
        flags: &Flags,
        env: &Environment,
    ) -> Result<(), BoxError> {
        match self {
            Initializer::FlagsAndEnv(func) => func(plugins, flags, env),
            Initializer::EnvOnly(func) => func(plugins, env),
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            Initializer::FlagsAndEnv(_) => "flags+env",
            Initializer::EnvOnly(_) => "env",
        }
    }
}

impl std::fmt::Debug for Initializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Initializer({})", self.shape_name())
    }
}

/// Initialize loaded plugins in declaration order.
///
/// Declared plugins that were not loaded (filtered out) are skipped. Returns
/// the number of entry points invoked.
pub fn initialize_plugins(
    registry: &PluginRegistry,
    declared: &[PluginReference],
    flags: &Flags,
    env: &Environment,
) -> PluginResult<usize> {
    let mut invoked = 0;
    for reference in declared {
        let name = reference.canonical_name();
        let plugin = match registry.get(name) {
            Ok(plugin) => plugin,
            Err(_) => {
                log::debug!("Plugin '{}' not loaded; skipping initialization", name);
                continue;
            }
        };

        let entry = match plugin.module().on_init() {
            Some(entry) => entry,
            None => {
                log::debug!("Plugin '{}' has no OnInit", name);
                continue;
            }
        };

        let initializer = Initializer::from_entry(name, &entry)?;
        log::debug!("Initializing plugin '{}' ({})", name, initializer.shape_name());
        initializer
            .invoke(registry, flags, env)
            .map_err(|source| PluginError::InitFailed {
                plugin_name: name.to_string(),
                source,
            })?;
        invoked += 1;
        log::info!("Initialized plugin '{}'", name);
    }
    Ok(invoked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::builtin::BuiltinLoader;
    use crate::plugin::types::PluginRegistrar;
    use std::sync::Mutex;

    // Entry points are plain fn pointers, so observations go through statics
    static CALLS: Mutex<Vec<String>> = Mutex::new(Vec::new());

    fn record(entry: String) {
        CALLS.lock().unwrap().push(entry);
    }

    fn init_first(plugins: &dyn Plugins, flags: &Flags, env: &Environment) -> Result<(), BoxError> {
        record(format!(
            "first:{}:{}:{}",
            plugins.names().join("+"),
            flags.get("mode").cloned().unwrap_or_default(),
            env.get("REGION").cloned().unwrap_or_default()
        ));
        Ok(())
    }

    fn init_second(plugins: &dyn Plugins, env: &Environment) -> Result<(), BoxError> {
        let peer = plugins.has("first");
        record(format!("second:{}:{}", peer, env.len()));
        Ok(())
    }

    fn init_failing(_: &dyn Plugins, _: &Environment) -> Result<(), BoxError> {
        Err("database unreachable".into())
    }

    fn module(entry: Option<InitEntry>) -> PluginRegistrar {
        let mut registrar = PluginRegistrar::new();
        if let Some(entry) = entry {
            registrar.on_init(entry);
        }
        registrar
    }

    fn references(names: &[&str]) -> Vec<PluginReference> {
        names.iter().map(|n| PluginReference::parse(n).unwrap()).collect()
    }

    #[test]
    fn test_from_entry_matches_supported_shapes() {
        let entry = InitEntry::flags_and_env(init_first);
        assert!(matches!(
            Initializer::from_entry("p", &entry),
            Ok(Initializer::FlagsAndEnv(_))
        ));
        let entry = InitEntry::env_only(init_second);
        assert!(matches!(
            Initializer::from_entry("p", &entry),
            Ok(Initializer::EnvOnly(_))
        ));
    }

    #[test]
    fn test_from_entry_rejects_unknown_shape() {
        let entry = InitEntry {
            shape: 9,
            with_flags: Some(init_first),
            env_only: None,
        };
        assert!(matches!(
            Initializer::from_entry("odd", &entry),
            Err(PluginError::UnsupportedInitSignature { shape: 9, .. })
        ));
    }

    #[test]
    fn test_from_entry_rejects_tag_without_function() {
        let entry = InitEntry {
            shape: INIT_SHAPE_FLAGS_AND_ENV,
            with_flags: None,
            env_only: Some(init_second),
        };
        let err = Initializer::from_entry("odd", &entry).unwrap_err();
        assert!(err.to_string().contains("unsupported initialization func"));
    }

    #[test]
    fn test_initialization_follows_declaration_order() {
        CALLS.lock().unwrap().clear();
        let loader = BuiltinLoader::new()
            .with_module("first", || module(Some(InitEntry::flags_and_env(init_first))))
            .with_module("second", || module(Some(InitEntry::env_only(init_second))))
            .with_module("plain", || module(None));
        let mut registry = PluginRegistry::new(Box::new(loader), "build", false);
        // Load order differs from declaration order
        registry.load_str("second").unwrap();
        registry.load_str("plain").unwrap();
        registry.load_str("first").unwrap();

        let flags = Flags::from([("mode".to_string(), "strict".to_string())]);
        let env = Environment::from([("REGION".to_string(), "eu".to_string())]);
        let declared = references(&["first", "plain", "second", "filtered"]);

        let invoked = initialize_plugins(&registry, &declared, &flags, &env).unwrap();

        assert_eq!(invoked, 2);
        assert_eq!(
            *CALLS.lock().unwrap(),
            vec!["first:second+plain+first:strict:eu", "second:true:1"]
        );
    }

    #[test]
    fn test_failure_aborts_initialization() {
        let loader = BuiltinLoader::new()
            .with_module("broken", || module(Some(InitEntry::env_only(init_failing))))
            .with_module("later", || module(Some(InitEntry::env_only(init_failing))));
        let mut registry = PluginRegistry::new(Box::new(loader), "build", false);
        registry.load_str("broken").unwrap();
        registry.load_str("later").unwrap();

        let err = initialize_plugins(
            &registry,
            &references(&["broken", "later"]),
            &Flags::new(),
            &Environment::new(),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "error initializing broken: database unreachable");
    }
}
