//! TOML configuration file discovery and loading

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::types::Config;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and the user config dir
pub const CONFIG_FILE_NAME: &str = "plugserve.toml";

const CONFIG_DIR_NAME: &str = "Plugserve";

impl Config {
    /// Read, parse and validate a configuration file
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&contents, path)
    }

    /// Parse and validate configuration text; `origin` is used in errors only
    pub fn from_toml_str(contents: &str, origin: &Path) -> ConfigResult<Self> {
        let config: Config = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        log::debug!(
            "Configuration {}: {} plugins, {} groups, {} routes",
            origin.display(),
            config.plugins.len(),
            config.groups.len(),
            config.routes.len()
        );
        Ok(config)
    }
}

/// Resolve which configuration file to use.
///
/// An explicitly requested file must exist. Otherwise `./plugserve.toml` is
/// preferred over `<config dir>/Plugserve/plugserve.toml`; `None` when
/// neither exists.
pub fn discover_config_path(explicit: Option<PathBuf>) -> ConfigResult<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "the specified configuration file does not exist",
                ),
                path,
            });
        }
        return Ok(Some(path));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }

    Ok(dirs::config_dir()
        .map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .filter(|p| p.exists()))
}
