//! The service facade
//!
//! Builds a running configuration from a [`Config`](crate::config::api::Config)
//! and exposes the process lifecycle: listen, ports, close.

pub(crate) mod error;
pub(crate) mod lifecycle;

pub mod api;
