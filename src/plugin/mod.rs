//! Plugin System Module
//!
//! Loads plugin modules, registers them by canonical name and runs their
//! initialization entry points. The registry and route composer talk to
//! modules only through the traits in `traits`, so shared-library and
//! built-in modules are interchangeable.

// Internal modules - all access should go through api module
pub(crate) mod abi;
pub(crate) mod activation;
pub(crate) mod builtin;
pub(crate) mod error;
pub(crate) mod initialization;
pub(crate) mod loader;
pub(crate) mod reference;
pub(crate) mod registry;
pub(crate) mod traits;
pub(crate) mod types;

// Public API module - the only public interface for the plugin system
pub mod api;

#[cfg(test)]
mod error_tests;
