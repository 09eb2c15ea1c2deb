//! Network serving
//!
//! The dual HTTP/HTTPS listener supervisor, the HTTP to HTTPS upgrader and
//! the panic log the router reports recovered handler panics to.

pub(crate) mod error;
pub(crate) mod panic_log;
pub(crate) mod supervisor;
pub(crate) mod upgrader;

pub mod api;
