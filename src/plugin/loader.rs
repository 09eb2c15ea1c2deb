//! Shared-library plugin loading
//!
//! Artifacts live in the plugin storage directory under the platform's
//! library naming (`libauth.so`, `auth.dll`, ...). With updates enabled, a
//! locator naming a local file or crate directory has its build output
//! copied into storage first.

use crate::core::version::{get_api_version, is_api_compatible};
use crate::plugin::abi::{
    ApiVersionFn, RegisterFn, API_VERSION_SYMBOL, ON_INIT_SYMBOL, REGISTER_SYMBOL,
};
use crate::plugin::error::{BoxError, PluginError, PluginResult};
use crate::plugin::reference::PluginReference;
use crate::plugin::traits::{ModuleLoader, PluginModule};
use crate::plugin::types::{Export, InitEntry, ModuleTable, PluginRegistrar};
use crate::routing::handler::Handler;
use libloading::Library;
use std::env::consts::{DLL_EXTENSION, DLL_PREFIX};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loads plugins from shared libraries with `libloading`
#[derive(Debug, Clone, Default)]
pub struct DylibLoader;

impl DylibLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ModuleLoader for DylibLoader {
    fn load(
        &self,
        reference: &PluginReference,
        storage_dir: &Path,
        update: bool,
    ) -> PluginResult<Box<dyn PluginModule>> {
        let name = reference.canonical_name();
        if update {
            refresh_artifact(reference, storage_dir)?;
        }

        let path = locate_artifact(reference, storage_dir).ok_or_else(|| PluginError::LoadError {
            plugin_name: name.to_string(),
            cause: format!(
                "no artifact among {:?} in {}",
                artifact_file_names(reference),
                storage_dir.display()
            ),
        })?;
        log::debug!("Plugin '{}' artifact: {}", name, path.display());

        // SAFETY: loading a library runs its initialisers; plugin artifacts are trusted
        let library = unsafe { Library::new(&path) }.map_err(|e| PluginError::LoadError {
            plugin_name: name.to_string(),
            cause: e.to_string(),
        })?;

        // SAFETY: the version symbol is declared by `declare_plugin!` with this signature
        let version: ApiVersionFn = unsafe { library.get::<ApiVersionFn>(API_VERSION_SYMBOL) }
            .map(|symbol| *symbol)
            .map_err(|e| PluginError::LoadError {
                plugin_name: name.to_string(),
                cause: format!("not a plugserve plugin: {}", e),
            })?;
        let plugin_version = version();
        if !is_api_compatible(plugin_version) {
            return Err(PluginError::VersionIncompatible {
                message: format!(
                    "plugin '{}' was built against API {}, host provides {}",
                    name,
                    plugin_version,
                    get_api_version()
                ),
            });
        }

        let mut registrar = PluginRegistrar::new();
        // SAFETY: declared by `declare_plugin!`; optional
        if let Ok(register) = unsafe { library.get::<RegisterFn>(REGISTER_SYMBOL) } {
            register(&mut registrar);
        }
        // SAFETY: `OnInit` is a static `InitEntry` declared by `declare_on_init!`
        let on_init = unsafe { library.get::<*const InitEntry>(ON_INIT_SYMBOL) }
            .ok()
            .map(|symbol| *symbol)
            .filter(|entry| !entry.is_null())
            .map(|entry| unsafe { *entry });

        let mut table = registrar.into_table();
        table.set_on_init(on_init);

        Ok(Box::new(DylibModule {
            table,
            library: Arc::new(library),
        }))
    }
}

/// A module backed by a loaded library.
/// The table is dropped before the library it points into.
struct DylibModule {
    table: ModuleTable,
    library: Arc<Library>,
}

impl Drop for DylibModule {
    // Handlers own the library themselves; exports cannot, so a library
    // whose exports outlive the module is never unloaded
    fn drop(&mut self) {
        if self.table.exports_in_use() {
            log::debug!("Plugin exports still referenced; library stays loaded");
            std::mem::forget(self.library.clone());
        }
    }
}

impl PluginModule for DylibModule {
    fn handler(&self, symbol: &str) -> Option<Handler> {
        self.table
            .handler(symbol)
            .map(|h| h.with_owner(self.library.clone()))
    }

    fn export(&self, symbol: &str) -> Option<Export> {
        self.table.export(symbol)
    }

    fn on_init(&self) -> Option<InitEntry> {
        self.table.on_init()
    }

    fn close(&self) -> Result<(), BoxError> {
        self.table.close()
    }
}

/// Artifact name stem: the final locator segment, without library file
/// naming when the locator names a library file
fn artifact_stem(reference: &PluginReference) -> String {
    let segment = reference
        .locator()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    match segment.strip_suffix(&format!(".{}", DLL_EXTENSION)) {
        Some(file_stem) => file_stem
            .strip_prefix(DLL_PREFIX)
            .filter(|s| !s.is_empty())
            .unwrap_or(file_stem)
            .to_string(),
        None => segment.to_string(),
    }
}

/// Candidate file names, most specific first
fn artifact_file_names(reference: &PluginReference) -> Vec<String> {
    let stem = artifact_stem(reference);
    let underscored = stem.replace('-', "_");
    let mut names = vec![
        format!("{}{}.{}", DLL_PREFIX, stem, DLL_EXTENSION),
        format!("{}{}.{}", DLL_PREFIX, underscored, DLL_EXTENSION),
        format!("{}.{}", stem, DLL_EXTENSION),
    ];
    names.dedup();
    names
}

fn locate_artifact(reference: &PluginReference, storage_dir: &Path) -> Option<PathBuf> {
    artifact_file_names(reference)
        .into_iter()
        .map(|name| storage_dir.join(name))
        .find(|path| path.is_file())
}

fn is_remote(locator: &str) -> bool {
    if locator.contains("://") {
        return true;
    }
    let local = locator.starts_with('.') || Path::new(locator).is_absolute();
    !local && !Path::new(locator).exists()
}

/// Copy the freshest local build of a plugin into storage
fn refresh_artifact(reference: &PluginReference, storage_dir: &Path) -> PluginResult<()> {
    let name = reference.canonical_name();
    if is_remote(reference.locator()) {
        log::warn!("Plugin '{}' has a remote locator; using the stored artifact", name);
        return Ok(());
    }

    let source = Path::new(reference.locator());
    let found = if source.is_file() {
        Some(source.to_path_buf())
    } else {
        artifact_file_names(reference).into_iter().find_map(|file| {
            [
                source.join("target").join("release").join(&file),
                source.join(&file),
            ]
            .into_iter()
            .find(|p| p.is_file())
        })
    };

    let source = found.ok_or_else(|| PluginError::LoadError {
        plugin_name: name.to_string(),
        cause: format!("no build artifact found under {}", source.display()),
    })?;
    let file_name = source
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&artifact_file_names(reference)[0]));
    let target = storage_dir.join(file_name);

    std::fs::create_dir_all(storage_dir)
        .map_err(|e| PluginError::io("create plugin storage", storage_dir, e))?;
    std::fs::copy(&source, &target)
        .map_err(|e| PluginError::io("copy plugin artifact", &source, e))?;
    log::info!("Updated plugin '{}' from {}", name, source.display());
    Ok(())
}
