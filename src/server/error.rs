//! Listener and panic log errors

use std::net::SocketAddr;
use std::path::PathBuf;

/// Result type alias for server operations
pub type ServerResult<T> = std::result::Result<T, ServerError>;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// HTTPS requested without a certificate directory
    #[error("invalid TLS directory: HTTPS port {port} is set but no TLS directory is configured")]
    InvalidTlsDirectory { port: u16 },

    #[error("failed to load TLS certificates from {dir}: {source}")]
    TlsConfig {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{listener} listener failed to bind {address}: {source}")]
    Bind {
        listener: &'static str,
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("{listener} listener failed: {source}")]
    Serve {
        listener: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Serving returned without an error
    #[error("{listener} listener stopped")]
    Stopped { listener: &'static str },

    #[error("listeners are already started")]
    AlreadyStarted,

    #[error("panic log {path}: {source}")]
    PanicLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
