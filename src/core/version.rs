//! Build metadata and plugin API versioning.
//! The generated version.rs from the build script is the single source of truth.

include!(concat!(env!("OUT_DIR"), "/version.rs"));

const DEFAULT_API_VERSION: u32 = 20250727;

/// Plugin API version this host (or plugin) was built against.
/// Falls back to a stable default if the build metadata is unparseable.
pub fn get_api_version() -> u32 {
    PLUGIN_API_VERSION.parse().unwrap_or(DEFAULT_API_VERSION)
}

/// Major version (year) of a `YYYYMMDD` API version
pub fn major_version(api_version: u32) -> u32 {
    api_version / 10000
}

/// Plugins built against the same API year are loadable
pub fn is_api_compatible(plugin_api_version: u32) -> bool {
    major_version(get_api_version()) == major_version(plugin_api_version)
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}
