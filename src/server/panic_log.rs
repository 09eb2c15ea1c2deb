//! Panic log
//!
//! Append-only file receiving every handler panic the router recovers.
//! Opened once at startup and closed once at shutdown; records arriving
//! after close are logged and dropped.

use crate::routing::api::{PanicHook, PanicRecord};
use crate::server::error::{ServerError, ServerResult};
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// File name of the panic log inside the data directory
pub const PANIC_LOG_FILE: &str = "panic.log";

#[derive(Debug)]
pub struct PanicLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl PanicLog {
    pub fn open(path: impl Into<PathBuf>) -> ServerResult<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ServerError::PanicLog {
                path: path.clone(),
                source,
            })?;
        log::debug!("Panic log opened at {}", path.display());
        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Append a record and report it through the log
    pub fn write(&self, record: &PanicRecord) {
        log::error!("Recovered handler panic: {}", record);

        let mut guard = self.lock();
        let Some(file) = guard.as_mut() else {
            log::warn!("Panic log is closed; dropping record for {}", record.path);
            return;
        };
        let line = format!(
            "{} {} {} {}\n",
            Utc::now().to_rfc3339(),
            record.method,
            record.path,
            record.message.replace('\n', " ")
        );
        if let Err(e) = file.write_all(line.as_bytes()) {
            log::warn!("Failed to write panic log {}: {}", self.path.display(), e);
        }
    }

    /// Flush and release the file. Closing twice is a no-op.
    pub fn close(&self) -> ServerResult<()> {
        match self.lock().take() {
            Some(file) => file.sync_all().map_err(|source| ServerError::PanicLog {
                path: self.path.clone(),
                source,
            }),
            None => Ok(()),
        }
    }

    /// Router hook writing into this log
    pub fn hook(self: &Arc<Self>) -> PanicHook {
        let log = Arc::clone(self);
        Arc::new(move |record: &PanicRecord| log.write(record))
    }

    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        // A panic while holding the lock leaves the file usable
        self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
