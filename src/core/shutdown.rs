//! Signal-driven shutdown
//!
//! The serving phase runs until the listeners fail or the process receives a
//! termination signal. A second signal forces an immediate exit.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Exit code used when a second signal forces termination
pub const FORCED_EXIT_CODE: i32 = 130;

/// Broadcasts a single shutdown request to any number of waiters
#[derive(Clone)]
pub struct ShutdownSignal {
    tx: broadcast::Sender<()>,
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create a signal that nothing triggers yet
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(8);
        Self {
            tx,
            requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a signal wired to the process termination signals.
    /// Must be called from within a tokio runtime.
    pub fn install() -> Self {
        let signal = Self::new();
        setup_signal_handlers(signal.clone());
        signal
    }

    /// Request shutdown
    pub fn trigger(&self) {
        self.requested.store(true, Ordering::Release);
        let _ = self.tx.send(());
    }

    /// Check if shutdown has been requested
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Resolve once shutdown has been requested
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        if self.is_requested() {
            return;
        }
        let _ = rx.recv().await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

fn setup_signal_handlers(signal: ShutdownSignal) {
    let received = Arc::new(AtomicUsize::new(0));

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal as unix_signal, SignalKind};

        // SAFETY: restoring the default disposition for SIGPIPE has no preconditions
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }

        for kind in [
            SignalKind::interrupt(),
            SignalKind::terminate(),
            SignalKind::hangup(),
            SignalKind::quit(),
        ] {
            let signal = signal.clone();
            let received = received.clone();
            tokio::spawn(async move {
                if let Ok(mut stream) = unix_signal(kind) {
                    while stream.recv().await.is_some() {
                        on_signal(&signal, &received);
                    }
                }
            });
        }
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                on_signal(&signal, &received);
            }
        });
    }
}

fn on_signal(signal: &ShutdownSignal, received: &AtomicUsize) {
    let previous = received.fetch_add(1, Ordering::AcqRel);
    if previous >= 1 {
        log::warn!("Second termination signal received; exiting");
        std::process::exit(FORCED_EXIT_CODE);
    }
    log::info!("Termination signal received; shutting down");
    signal.trigger();
}
