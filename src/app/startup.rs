//! Application startup
//!
//! Parse the command line, resolve the configuration, start logging, build
//! the service and serve until a listener fails or a termination signal
//! arrives. The service is closed on either path.

use crate::app::cli::api::{resolve_config, Args};
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownSignal;
use crate::core::version::{build_time, get_api_version, git_hash};
use crate::service::api::Service;
use clap::Parser;

/// Process exit code for a clean shutdown
pub const EXIT_OK: i32 = 0;
/// Process exit code for any fatal error
pub const EXIT_FAILURE: i32 = 1;

/// Run the binary; returns the process exit code
pub async fn startup() -> i32 {
    let args = Args::parse();

    // Logging options may come from the file, so it is read before the
    // logger starts; a resolution failure is reported with CLI options only
    let resolved = resolve_config(&args).await;
    let (log_level, log_format, log_file) = match &resolved {
        Ok(config) => (
            config.log_level.as_deref(),
            config.log_format.as_deref(),
            config.log_file.as_deref(),
        ),
        Err(_) => (
            args.log_level.as_deref(),
            args.log_format.as_deref(),
            args.log_file.as_deref(),
        ),
    };
    if let Err(e) = init_logging(log_level, log_format, log_file, args.use_color()) {
        eprintln!("Error initializing logging: {}", e);
        return EXIT_FAILURE;
    }

    log::info!(
        "plugserve {} starting (api {}, {} built {})",
        env!("CARGO_PKG_VERSION"),
        get_api_version(),
        git_hash(),
        build_time()
    );

    let config = match resolved {
        Ok(config) => config,
        Err(e) => {
            log::error!("FATAL: {}", e);
            return EXIT_FAILURE;
        }
    };

    let service = match Service::new(config, &args.data_dir) {
        Ok(service) => service,
        Err(e) => {
            log_error_with_context(&e, "Service startup");
            return EXIT_FAILURE;
        }
    };

    let shutdown = ShutdownSignal::install();
    let mut code = EXIT_OK;
    tokio::select! {
        error = service.listen() => {
            log_error_with_context(&error, "Serving");
            code = EXIT_FAILURE;
        }
        _ = shutdown.wait() => {
            log::info!("Shutting down");
        }
    }

    if let Err(e) = service.close() {
        log_error_with_context(&e, "Shutdown");
        code = EXIT_FAILURE;
    }
    code
}
