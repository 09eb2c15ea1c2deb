//! Configuration object consumed by the service

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::handler_ref::HandlerRef;
use crate::plugin::reference::PluginReference;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

/// Runtime flags (`require`, plugin-specific switches)
pub type Flags = HashMap<String, String>;

/// Environment handed to plugin initializers
pub type Environment = HashMap<String, String>;

/// Default plugin storage directory, relative to the working directory
pub const DEFAULT_PLUGIN_DIR: &str = "build";

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Working directory the service changes into at startup
    pub dir: Option<PathBuf>,
    /// HTTP port, 0 disables plain HTTP
    pub port: u16,
    /// HTTPS port, 0 disables TLS
    pub tls_port: u16,
    /// Directory holding `server.crt` and `server.key`
    pub tls_dir: PathBuf,
    /// Directory holding loadable plugin artifacts
    pub plugin_dir: PathBuf,
    /// Refresh plugin artifacts from their locators before loading
    pub perform_update: bool,
    pub flags: Flags,
    #[serde(rename = "env")]
    pub environment: Environment,
    pub plugins: Vec<PluginReference>,
    #[serde(rename = "group")]
    pub groups: Vec<GroupDecl>,
    #[serde(rename = "route")]
    pub routes: Vec<RouteDecl>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dir: None,
            port: 0,
            tls_port: 0,
            tls_dir: PathBuf::new(),
            plugin_dir: PathBuf::from(DEFAULT_PLUGIN_DIR),
            perform_update: false,
            flags: Flags::new(),
            environment: Environment::new(),
            plugins: Vec::new(),
            groups: Vec::new(),
            routes: Vec::new(),
            log_level: None,
            log_format: None,
            log_file: None,
        }
    }
}

/// A named routing scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GroupDecl {
    pub name: String,
    /// Path prefix, appended to the parent's prefix
    pub path: String,
    /// Parent group; the root scope when absent
    pub group: Option<String>,
    /// Handlers run before every route in the scope
    pub handlers: Vec<HandlerRef>,
}

/// A single HTTP endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RouteDecl {
    /// HTTP method, case-insensitive; GET when absent or unrecognised
    pub method: Option<String>,
    pub path: String,
    /// Owning group; the root scope when absent
    pub group: Option<String>,
    pub handlers: Vec<HandlerRef>,
}

impl Config {
    /// Look up a group by name. An absent or empty name means the root scope
    /// and yields `Ok(None)`; an unknown name is an error.
    pub fn get_group(&self, name: Option<&str>) -> ConfigResult<Option<&GroupDecl>> {
        match name.filter(|n| !n.is_empty()) {
            None => Ok(None),
            Some(name) => self
                .groups
                .iter()
                .find(|g| g.name == name)
                .map(Some)
                .ok_or_else(|| ConfigError::UnknownGroup {
                    name: name.to_string(),
                    referenced_by: "lookup".to_string(),
                }),
        }
    }

    /// Check declarations that can be verified without loading anything
    pub fn validate(&self) -> ConfigResult<()> {
        let mut names = HashSet::new();
        for (index, group) in self.groups.iter().enumerate() {
            if group.name.is_empty() {
                return Err(ConfigError::EmptyGroupName { index });
            }
            if !names.insert(group.name.as_str()) {
                return Err(ConfigError::DuplicateGroup {
                    name: group.name.clone(),
                });
            }
        }

        for group in &self.groups {
            self.check_group_ref(group.group.as_deref(), || format!("group \"{}\"", group.name))?;
        }
        for (index, route) in self.routes.iter().enumerate() {
            self.check_group_ref(route.group.as_deref(), || format!("route #{}", index))?;
        }

        Ok(())
    }

    /// Merge runtime flags over the ones declared in the file
    pub fn merge_flags<I>(&mut self, flags: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.flags.extend(flags);
    }

    fn check_group_ref<F>(&self, name: Option<&str>, referenced_by: F) -> ConfigResult<()>
    where
        F: FnOnce() -> String,
    {
        match name.filter(|n| !n.is_empty()) {
            Some(name) if !self.groups.iter().any(|g| g.name == name) => {
                Err(ConfigError::UnknownGroup {
                    name: name.to_string(),
                    referenced_by: referenced_by(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for RouteDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers: Vec<String> = self.handlers.iter().map(|h| h.to_string()).collect();
        write!(
            f,
            "{} {} [{}]",
            self.method.as_deref().unwrap_or("GET").to_uppercase(),
            self.path,
            handlers.join(", ")
        )?;
        if let Some(group) = self.group.as_deref().filter(|g| !g.is_empty()) {
            write!(f, " in group \"{}\"", group)?;
        }
        Ok(())
    }
}
