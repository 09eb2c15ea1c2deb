//! Service lifecycle
//!
//! Startup runs strictly in sequence: working directory, data and plugin
//! directories, panic log, plugin loading, plugin initialization, group and
//! route composition. Only then can the listeners start. `close` tears
//! down the plugins and the panic log exactly once.

use crate::config::api::Config;
use crate::plugin::api::{
    initialize_plugins, DylibLoader, ModuleLoader, PluginRegistry, RequireFilter,
};
use crate::routing::api::{Composer, RouterTree};
use crate::server::api::{ListenerConfig, ListenerSupervisor, PanicLog, ServerError, PANIC_LOG_FILE};
use crate::service::error::{ServiceError, ServiceResult};
use axum::Router;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A composed plugin-hosted HTTP service
pub struct Service {
    config: Config,
    data_dir: PathBuf,
    registry: Arc<PluginRegistry>,
    router: Router,
    supervisor: ListenerSupervisor,
    panic_log: Arc<PanicLog>,
    closed: AtomicBool,
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("data_dir", &self.data_dir)
            .field("registry", &self.registry)
            .field("supervisor", &self.supervisor)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Service {
    /// Build a service loading plugins from shared libraries
    pub fn new(config: Config, data_dir: impl Into<PathBuf>) -> ServiceResult<Self> {
        Self::with_loader(config, data_dir, Box::new(DylibLoader::new()))
    }

    /// Build a service loading plugins through `loader`
    pub fn with_loader(
        config: Config,
        data_dir: impl Into<PathBuf>,
        loader: Box<dyn ModuleLoader>,
    ) -> ServiceResult<Self> {
        let data_dir = data_dir.into();

        if let Some(dir) = config.dir.as_deref().filter(|d| !d.as_os_str().is_empty()) {
            std::env::set_current_dir(dir).map_err(|source| ServiceError::WorkingDirectory {
                dir: dir.to_path_buf(),
                source,
            })?;
            log::debug!("Working directory is now {}", dir.display());
        }

        create_dir(&data_dir)?;
        create_dir(&config.plugin_dir)?;

        let panic_log = Arc::new(
            PanicLog::open(data_dir.join(PANIC_LOG_FILE)).map_err(ServiceError::OpenPanicLog)?,
        );

        let filter = RequireFilter::from_flags(&config.flags);
        let mut registry =
            PluginRegistry::new(loader, config.plugin_dir.clone(), config.perform_update);
        for reference in &config.plugins {
            if !filter.allows(reference.canonical_name()) {
                log::debug!(
                    "Plugin '{}' not activated by require filter",
                    reference.canonical_name()
                );
                continue;
            }
            registry.load(reference).map_err(ServiceError::LoadPlugins)?;
        }
        let registry = Arc::new(registry);

        initialize_plugins(&registry, &config.plugins, &config.flags, &config.environment)
            .map_err(ServiceError::InitPlugins)?;

        let mut tree = RouterTree::new();
        {
            let mut composer = Composer::new(&config, &*registry, &filter, &mut tree);
            composer.init_groups().map_err(ServiceError::InitGroups)?;
            composer.init_routes().map_err(ServiceError::InitRoutes)?;
        }
        tree.set_panic_hook(panic_log.hook());
        let router = tree.build().map_err(ServiceError::BuildRouter)?;

        let supervisor = ListenerSupervisor::new(ListenerConfig {
            port: config.port,
            tls_port: config.tls_port,
            tls_dir: config.tls_dir.clone(),
            ..ListenerConfig::default()
        });

        log::info!(
            "Service ready: {} plugins, {} routes",
            registry.len(),
            tree.routes().len()
        );
        Ok(Self {
            config,
            data_dir,
            registry,
            router,
            supervisor,
            panic_log,
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// The composed router, for serving it some other way or for tests
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn port(&self) -> u16 {
        self.supervisor.port()
    }

    pub fn tls_port(&self) -> u16 {
        self.supervisor.tls_port()
    }

    /// Serve until the first listener terminates and return why
    pub async fn listen(&self) -> ServiceError {
        ServiceError::Listen(self.supervisor.listen(self.router()).await)
    }

    /// Serve until every configured listener terminates
    pub async fn listen_all(&self) -> Vec<ServerError> {
        self.supervisor.listen_all(self.router()).await
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Release the plugins and the panic log. Only the first call does
    /// anything; later calls return [`ServiceError::AlreadyClosed`].
    pub fn close(&self) -> ServiceResult<()> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ServiceError::AlreadyClosed);
        }

        let mut errors = Vec::new();
        if let Err(e) = self.registry.close() {
            errors.push(ServiceError::ClosePlugins(e));
        }
        if let Err(e) = self.panic_log.close() {
            errors.push(ServiceError::ClosePanicLog(e));
        }

        if errors.is_empty() {
            log::info!("Service closed");
            Ok(())
        } else {
            Err(ServiceError::Shutdown { errors })
        }
    }
}

fn create_dir(path: &Path) -> ServiceResult<()> {
    std::fs::create_dir_all(path).map_err(|source| ServiceError::Directory {
        path: path.to_path_buf(),
        source,
    })
}
