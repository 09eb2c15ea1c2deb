//! Plugin references
//!
//! A plugin is declared as `locator[@version][#variant][ as alias]`. The
//! canonical name it is registered under is the alias when one is given,
//! otherwise the final path segment of the locator.

use crate::plugin::error::PluginError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ALIAS_SEPARATOR: &str = " as ";

/// Parsed plugin reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PluginReference {
    raw: String,
    locator: String,
    version: Option<String>,
    variant: Option<String>,
    alias: Option<String>,
    name: String,
}

impl PluginReference {
    pub fn parse(reference: &str) -> Result<Self, PluginError> {
        let raw = reference.trim();
        let invalid = |reason: &str| PluginError::InvalidReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let (target, alias) = match reference.trim_start().split_once(ALIAS_SEPARATOR) {
            Some((target, alias)) => {
                let alias = alias.trim();
                if alias.is_empty() {
                    return Err(invalid("alias after \"as\" is empty"));
                }
                (target.trim(), Some(alias.to_string()))
            }
            None => (raw, None),
        };

        let (target, variant) = split_suffix(target, '#');
        let (locator, version) = split_suffix(target, '@');
        if locator.is_empty() {
            return Err(invalid("locator is empty"));
        }

        let name = match &alias {
            Some(alias) => alias.clone(),
            None => last_segment(locator).to_string(),
        };
        if name.is_empty() {
            return Err(invalid("locator has no final path segment"));
        }

        Ok(Self {
            raw: raw.to_string(),
            locator: locator.to_string(),
            version,
            variant,
            alias,
            name,
        })
    }

    /// Name the plugin is registered under
    pub fn canonical_name(&self) -> &str {
        &self.name
    }

    /// Where the plugin comes from, without version or variant
    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The reference exactly as declared (trimmed)
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Canonical name for a reference string; `None` when it does not parse
pub fn canonical_name(reference: &str) -> Option<String> {
    PluginReference::parse(reference)
        .ok()
        .map(|r| r.canonical_name().to_string())
}

fn split_suffix(value: &str, separator: char) -> (&str, Option<String>) {
    match value.split_once(separator) {
        Some((head, tail)) if !tail.is_empty() => (head, Some(tail.to_string())),
        Some((head, _)) => (head, None),
        None => (value, None),
    }
}

fn last_segment(locator: &str) -> &str {
    locator.rsplit('/').next().unwrap_or(locator)
}

impl FromStr for PluginReference {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PluginReference {
    type Error = PluginError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PluginReference> for String {
    fn from(value: PluginReference) -> Self {
        value.raw
    }
}

impl fmt::Display for PluginReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
