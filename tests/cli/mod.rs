//! CLI integration test modules

pub mod config_resolution;
