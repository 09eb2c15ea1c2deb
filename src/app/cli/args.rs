//! Command line arguments

use crate::plugin::api::REQUIRE_FLAG;
use clap::{ArgAction, Parser};
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "plugserve")]
#[command(about = "Plugin-hosted HTTP service")]
#[command(version)]
#[command(after_help = " * can be specified multiple times")]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Data directory (created when absent)
    #[arg(short = 'd', long = "data-dir", value_name = "DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Only activate plugins named in this list
    #[arg(short = 'r', long = "require", value_name = "PLUGINS")]
    pub require: Option<String>,

    /// Runtime flag passed to plugins*
    #[arg(long = "flag", value_name = "KEY=VALUE", value_parser = parse_key_value, action = ArgAction::Append)]
    pub flags: Vec<(String, String)>,

    /// Refresh plugin artifacts before loading
    #[arg(short = 'u', long = "update")]
    pub update: bool,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<String>,

    /// Force colored log output
    #[arg(long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Args {
    /// Flags to merge over the configuration file, `--require` last
    pub fn runtime_flags(&self) -> Vec<(String, String)> {
        let mut flags = self.flags.clone();
        if let Some(require) = &self.require {
            flags.push((REQUIRE_FLAG.to_string(), require.clone()));
        }
        flags
    }

    /// Colour when forced, otherwise when stderr is a terminal and
    /// `NO_COLOR` is unset
    pub fn use_color(&self) -> bool {
        if self.color {
            return true;
        }
        if self.no_color || std::env::var_os("NO_COLOR").is_some() {
            return false;
        }
        std::io::stderr().is_terminal()
    }
}

fn parse_key_value(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got \"{}\"", value)),
    }
}
