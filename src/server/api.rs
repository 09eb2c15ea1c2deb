//! Public API for network serving

pub use crate::server::error::{ServerError, ServerResult};
pub use crate::server::panic_log::{PanicLog, PANIC_LOG_FILE};
pub use crate::server::supervisor::{
    ListenerConfig, ListenerState, ListenerSupervisor, CERT_FILE, KEY_FILE,
};
pub use crate::server::upgrader::upgrader;
