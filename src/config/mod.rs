//! Configuration
//!
//! The typed configuration object the service is built from, loaded from
//! TOML. Handler and plugin references are parsed during loading so that
//! malformed declarations fail before any plugin is touched.

pub(crate) mod error;
pub(crate) mod handler_ref;
pub(crate) mod loader;
pub(crate) mod types;

pub mod api;
