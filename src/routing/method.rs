//! HTTP methods a route may be registered for

use axum::routing::MethodFilter;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
}

impl HttpMethod {
    /// Method for a route declaration; absent or unrecognised values are GET
    pub fn from_config(method: Option<&str>) -> Self {
        match method.map(|m| HttpMethod::from_str(m.trim())) {
            Some(Ok(method)) => method,
            Some(Err(_)) => {
                log::debug!("Unrecognised method {:?}; registering as GET", method);
                HttpMethod::Get
            }
            None => HttpMethod::Get,
        }
    }

    pub(crate) fn filter(self) -> MethodFilter {
        match self {
            HttpMethod::Get => MethodFilter::GET,
            HttpMethod::Put => MethodFilter::PUT,
            HttpMethod::Post => MethodFilter::POST,
            HttpMethod::Delete => MethodFilter::DELETE,
            HttpMethod::Options => MethodFilter::OPTIONS,
        }
    }
}
