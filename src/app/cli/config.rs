//! Configuration resolution for the binary
//!
//! Finds the configuration file, loads it, and applies command line
//! overrides on top.

use crate::app::cli::args::Args;
use crate::config::api::{discover_config_path, Config, ConfigResult};

/// Load the configuration the command line points at.
/// Without any configuration file the defaults are used.
pub async fn resolve_config(args: &Args) -> ConfigResult<Config> {
    let mut config = match discover_config_path(args.config.clone())? {
        Some(path) => {
            log::info!("Using configuration {}", path.display());
            Config::load(&path).await?
        }
        None => {
            log::warn!("No configuration file found; using defaults");
            Config::default()
        }
    };
    apply_overrides(&mut config, args);
    Ok(config)
}

/// Command line values win over the file
pub fn apply_overrides(config: &mut Config, args: &Args) {
    config.merge_flags(args.runtime_flags());
    if args.update {
        config.perform_update = true;
    }
    if args.log_level.is_some() {
        config.log_level = args.log_level.clone();
    }
    if args.log_format.is_some() {
        config.log_format = args.log_format.clone();
    }
    if args.log_file.is_some() {
        config.log_file = args.log_file.clone();
    }
}
