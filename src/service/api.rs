//! Public API for the service facade

pub use crate::service::error::{ServiceError, ServiceResult};
pub use crate::service::lifecycle::Service;
