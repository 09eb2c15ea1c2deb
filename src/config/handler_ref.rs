//! Handler references
//!
//! A handler reference names an exported handler as `plugin.Symbol`. It is
//! parsed while the configuration is deserialized, so malformed references
//! never reach route composition; binding to a loaded plugin happens later
//! against the populated registry.

use crate::config::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed `plugin.Symbol` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HandlerRef {
    plugin: String,
    symbol: String,
}

impl HandlerRef {
    pub fn new(plugin: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            symbol: symbol.into(),
        }
    }

    /// Canonical name of the plugin that exports the handler
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Name the handler is exported under
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl FromStr for HandlerRef {
    type Err = ConfigError;

    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        let trimmed = reference.trim();
        let (plugin, symbol) = trimmed
            .split_once('.')
            .ok_or_else(|| ConfigError::malformed(reference, "expected \"plugin.Symbol\""))?;

        if plugin.is_empty() {
            return Err(ConfigError::malformed(reference, "missing plugin name"));
        }
        if symbol.is_empty() {
            return Err(ConfigError::malformed(reference, "missing handler symbol"));
        }

        Ok(Self::new(plugin, symbol))
    }
}

impl TryFrom<String> for HandlerRef {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HandlerRef> for String {
    fn from(value: HandlerRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.plugin, self.symbol)
    }
}
