//! Plugin activation
//!
//! The `require` flag restricts which plugins, groups and routes are active
//! in a run. A plugin passes when its canonical name occurs in the flag
//! value, so `require = "auth,users"` admits `auth` and `users`.
//!
//! Groups are optional containers and activate when any of their handlers
//! passes. Routes are atomic and activate only when all of their handlers
//! pass.

use crate::config::api::{Flags, HandlerRef};

/// Flag key holding the activation filter
pub const REQUIRE_FLAG: &str = "require";

/// Activation predicate built from the `require` flag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequireFilter {
    required: Option<String>,
}

impl RequireFilter {
    /// No filtering; everything is active
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(required: impl Into<String>) -> Self {
        let required = required.into();
        Self {
            required: Some(required).filter(|r| !r.trim().is_empty()),
        }
    }

    /// Build from runtime flags; an absent or blank flag disables filtering
    pub fn from_flags(flags: &Flags) -> Self {
        flags
            .get(REQUIRE_FLAG)
            .map(|r| Self::new(r.as_str()))
            .unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.required.is_some()
    }

    pub fn allows(&self, plugin: &str) -> bool {
        match &self.required {
            Some(required) => required.contains(plugin),
            None => true,
        }
    }

    /// At least one handler names an admitted plugin
    pub fn allows_group(&self, handlers: &[HandlerRef]) -> bool {
        !self.is_active() || handlers.iter().any(|h| self.allows(h.plugin()))
    }

    /// Every handler names an admitted plugin
    pub fn allows_route(&self, handlers: &[HandlerRef]) -> bool {
        handlers.iter().all(|h| self.allows(h.plugin()))
    }
}
