//! CLI module containing argument parsing and configuration resolution

pub mod api;
pub(crate) mod args;
pub(crate) mod config;

#[cfg(test)]
mod tests;
