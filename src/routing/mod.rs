//! Routing
//!
//! Request handlers, the router tree built on axum, and the composer that
//! turns configured groups and routes into that tree.

pub(crate) mod composer;
pub(crate) mod error;
pub(crate) mod handler;
pub(crate) mod method;
pub(crate) mod tree;

pub mod api;
