//! plugserve: a plugin-hosted HTTP service runtime
//!
//! Plugins are loaded at startup, register request handlers, and are wired
//! into a routing tree described by configuration. The tree is served over
//! HTTP and HTTPS concurrently.

pub mod app;
pub mod config;
pub mod core;
pub mod plugin;
pub mod routing;
pub mod server;
pub mod service;
