//! Service integration test modules

pub mod composition;
pub mod lifecycle;
pub mod listeners;
