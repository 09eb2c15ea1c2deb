//! Dual listener supervisor
//!
//! Runs the HTTP and HTTPS listeners as two tasks feeding one outcome
//! channel. `listen` returns the first outcome; the other task keeps
//! serving and its outcome is not observed. With neither port configured
//! no outcome ever arrives and `listen` blocks. `listen_all` waits for both.

use crate::server::error::ServerError;
use crate::server::upgrader::upgrader;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::mpsc;

pub const CERT_FILE: &str = "server.crt";
pub const KEY_FILE: &str = "server.key";

/// Ports and certificates for both listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// HTTP port, 0 disables plain HTTP
    pub port: u16,
    /// HTTPS port, 0 disables TLS
    pub tls_port: u16,
    /// Directory holding `server.crt` and `server.key`
    pub tls_dir: PathBuf,
    pub bind_address: IpAddr,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: 0,
            tls_port: 0,
            tls_dir: PathBuf::new(),
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ListenerState {
    NotStarted = 0,
    Listening = 1,
    Terminated = 2,
}

impl ListenerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ListenerState::NotStarted,
            1 => ListenerState::Listening,
            _ => ListenerState::Terminated,
        }
    }
}

#[derive(Debug)]
pub struct ListenerSupervisor {
    config: ListenerConfig,
    state: AtomicU8,
}

impl ListenerSupervisor {
    pub fn new(config: ListenerConfig) -> Self {
        Self {
            config,
            state: AtomicU8::new(ListenerState::NotStarted as u8),
        }
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn tls_port(&self) -> u16 {
        self.config.tls_port
    }

    pub fn state(&self) -> ListenerState {
        ListenerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Serve `app` and return the first terminal outcome.
    /// Never returns when neither port is configured.
    pub async fn listen(&self, app: Router) -> ServerError {
        let mut outcomes = match self.start(app) {
            Ok(rx) => rx,
            Err(e) => return e,
        };
        let outcome = match outcomes.recv().await {
            Some(outcome) => outcome,
            None => {
                log::warn!("No listener configured; serving nothing until shutdown");
                std::future::pending::<ServerError>().await
            }
        };
        self.terminate();
        outcome
    }

    /// Serve `app` and return the outcome of every listener that was
    /// configured, in completion order. Empty when neither port is set.
    pub async fn listen_all(&self, app: Router) -> Vec<ServerError> {
        let mut outcomes = match self.start(app) {
            Ok(rx) => rx,
            Err(e) => return vec![e],
        };
        let mut errors = Vec::new();
        while let Some(outcome) = outcomes.recv().await {
            errors.push(outcome);
        }
        self.terminate();
        errors
    }

    fn start(&self, app: Router) -> Result<mpsc::Receiver<ServerError>, ServerError> {
        self.state
            .compare_exchange(
                ListenerState::NotStarted as u8,
                ListenerState::Listening as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| ServerError::AlreadyStarted)?;

        // One slot per listener
        let (tx, rx) = mpsc::channel(2);
        let config = self.config.clone();
        let http_tx = tx.clone();
        let http_app = app.clone();
        tokio::spawn(async move {
            if let Some(outcome) = serve_http(&config, http_app).await {
                let _ = http_tx.send(outcome).await;
            }
        });

        let config = self.config.clone();
        tokio::spawn(async move {
            if let Some(outcome) = serve_https(&config, app).await {
                let _ = tx.send(outcome).await;
            }
        });
        Ok(rx)
    }

    fn terminate(&self) {
        self.state
            .store(ListenerState::Terminated as u8, Ordering::Release);
    }
}

/// Plain HTTP, or the upgrader when HTTPS is also configured.
/// `None` when HTTP is disabled.
async fn serve_http(config: &ListenerConfig, app: Router) -> Option<ServerError> {
    if config.port == 0 {
        return None;
    }
    let app = if config.tls_port > 0 {
        upgrader(config.tls_port)
    } else {
        app
    };

    let address = SocketAddr::new(config.bind_address, config.port);
    let listener = match tokio::net::TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(source) => {
            return Some(ServerError::Bind {
                listener: "http",
                address,
                source,
            })
        }
    };
    log::info!(
        "HTTP listening on {}{}",
        address,
        if config.tls_port > 0 { " (upgrading to HTTPS)" } else { "" }
    );

    Some(match axum::serve(listener, app.into_make_service()).await {
        Ok(()) => ServerError::Stopped { listener: "http" },
        Err(source) => ServerError::Serve {
            listener: "http",
            source,
        },
    })
}

/// HTTPS with certificates from the TLS directory.
/// `None` when HTTPS is disabled.
async fn serve_https(config: &ListenerConfig, app: Router) -> Option<ServerError> {
    if config.tls_port == 0 {
        return None;
    }
    if config.tls_dir.as_os_str().is_empty() {
        return Some(ServerError::InvalidTlsDirectory {
            port: config.tls_port,
        });
    }

    let tls = match RustlsConfig::from_pem_file(
        config.tls_dir.join(CERT_FILE),
        config.tls_dir.join(KEY_FILE),
    )
    .await
    {
        Ok(tls) => tls,
        Err(source) => {
            return Some(ServerError::TlsConfig {
                dir: config.tls_dir.clone(),
                source,
            })
        }
    };

    let address = SocketAddr::new(config.bind_address, config.tls_port);
    let listener = match bind_std(address) {
        Ok(listener) => listener,
        Err(source) => {
            return Some(ServerError::Bind {
                listener: "https",
                address,
                source,
            })
        }
    };
    log::info!("HTTPS listening on {}", address);

    Some(
        match axum_server::from_tcp_rustls(listener, tls)
            .serve(app.into_make_service())
            .await
        {
            Ok(()) => ServerError::Stopped { listener: "https" },
            Err(source) => ServerError::Serve {
                listener: "https",
                source,
            },
        },
    )
}

/// Non-blocking std listener, as axum-server expects
fn bind_std(address: SocketAddr) -> std::io::Result<std::net::TcpListener> {
    let listener = std::net::TcpListener::bind(address)?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}
