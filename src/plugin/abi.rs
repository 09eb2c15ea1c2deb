//! Plugin ABI
//!
//! Symbols a shared-library plugin exports and the macros that declare them.
//! Plugins are Rust crates built with the same toolchain as the host; the
//! registration function and `OnInit` slots use the Rust ABI.
//!
//! ```ignore
//! use plugserve::plugin::api::*;
//!
//! fn register(registrar: &mut PluginRegistrar) {
//!     registrar.handler("Hello", |_| Some(Response::text(StatusCode::OK, "hello")));
//! }
//!
//! fn setup(plugins: &dyn Plugins, flags: &Flags, env: &Environment) -> Result<(), BoxError> {
//!     Ok(())
//! }
//!
//! plugserve::declare_plugin!(register);
//! plugserve::declare_on_init!(flags_and_env: setup);
//! ```

use crate::plugin::types::PluginRegistrar;

/// `extern "C" fn() -> u32` returning the API version the plugin was built against
pub const API_VERSION_SYMBOL: &[u8] = b"plugserve_plugin_api_version\0";

/// `fn(&mut PluginRegistrar)` registering handlers and exports
pub const REGISTER_SYMBOL: &[u8] = b"plugserve_plugin_register\0";

/// Static [`InitEntry`](crate::plugin::types::InitEntry)
pub const ON_INIT_SYMBOL: &[u8] = b"OnInit\0";

pub type ApiVersionFn = extern "C" fn() -> u32;

pub type RegisterFn = fn(&mut PluginRegistrar);

/// Export the version and registration symbols for a plugin crate
#[macro_export]
macro_rules! declare_plugin {
    ($register:path) => {
        #[no_mangle]
        pub extern "C" fn plugserve_plugin_api_version() -> u32 {
            $crate::core::version::get_api_version()
        }

        #[no_mangle]
        pub fn plugserve_plugin_register(registrar: &mut $crate::plugin::api::PluginRegistrar) {
            $register(registrar)
        }
    };
}

/// Export the `OnInit` entry point in one of the supported shapes
#[macro_export]
macro_rules! declare_on_init {
    (flags_and_env: $init:path) => {
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        pub static OnInit: $crate::plugin::api::InitEntry =
            $crate::plugin::api::InitEntry::flags_and_env($init);
    };
    (env_only: $init:path) => {
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        pub static OnInit: $crate::plugin::api::InitEntry =
            $crate::plugin::api::InitEntry::env_only($init);
    };
}
