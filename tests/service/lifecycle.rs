//! Startup failures and shutdown

use crate::common::{loader, parse_config, Workspace};
use plugserve::config::api::Config;
use plugserve::plugin::api::{PluginError, PluginRegistrar};
use plugserve::service::api::{Service, ServiceError};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_startup_creates_directories() {
    let workspace = Workspace::new();
    let mut config = parse_config("port = 8080\ntls-port = 8443\n");
    config.tls_dir = workspace.root.path().join("tls");
    let service = workspace.service(config).unwrap();

    assert!(workspace.data_dir().is_dir());
    assert!(workspace.plugin_dir().is_dir());
    assert!(workspace.data_dir().join("panic.log").is_file());
    assert_eq!(service.port(), 8080);
    assert_eq!(service.tls_port(), 8443);
}

#[test]
fn test_plugin_init_failure_stops_startup() {
    let workspace = Workspace::new();
    let mut config = parse_config(r#"plugins = ["auth", "users"]"#);
    config.environment.insert("USERS_DB".to_string(), String::new());

    let err = workspace.service(config).unwrap_err();
    match err {
        ServiceError::InitPlugins(PluginError::InitFailed { plugin_name, .. }) => {
            assert_eq!(plugin_name, "users")
        }
        other => panic!("expected init failure, got {:?}", other),
    }
}

#[test]
fn test_initializers_see_flags_and_exports() {
    let workspace = Workspace::new();
    let config = parse_config(
        r#"
plugins = ["auth", "audit"]

[flags]
audit = "strict"
"#,
    );
    assert!(workspace.service(config).is_ok());

    // Strict auditing without the auth plugin cannot find the realm
    let workspace = Workspace::new();
    let config = parse_config(
        r#"
plugins = ["audit"]

[flags]
audit = "strict"
"#,
    );
    assert!(matches!(
        workspace.service(config),
        Err(ServiceError::InitPlugins(_))
    ));
}

#[test]
fn test_unknown_module_fails_loading() {
    let workspace = Workspace::new();
    let config = parse_config(r#"plugins = ["github.com/acme/ghost@v1"]"#);

    let err = workspace.service(config).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::LoadPlugins(PluginError::LoadError { .. })
    ));
    assert!(err.to_string().starts_with("error loading plugins: "));
}

#[test]
fn test_duplicate_canonical_name_fails_loading() {
    let workspace = Workspace::new();
    let config = parse_config(r#"plugins = ["a/users", "b/users@v2"]"#);

    assert!(matches!(
        workspace.service(config),
        Err(ServiceError::LoadPlugins(PluginError::DuplicatePlugin { .. }))
    ));
}

#[test]
fn test_close_runs_plugin_hooks_once() {
    let closed = Arc::new(AtomicUsize::new(0));
    let counter = closed.clone();
    let loader = loader().with_module("tracked", move || {
        let counter = counter.clone();
        let mut r = PluginRegistrar::new();
        r.on_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        r
    });

    let workspace = Workspace::new();
    let mut config = parse_config(r#"plugins = ["tracked", "users"]"#);
    config.plugin_dir = workspace.plugin_dir();
    let service = Service::with_loader(config, workspace.data_dir(), Box::new(loader)).unwrap();

    service.close().unwrap();
    assert!(service.is_closed());
    assert!(service.registry().is_closed());
    assert!(matches!(service.close(), Err(ServiceError::AlreadyClosed)));
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[test]
#[serial]
fn test_startup_changes_working_directory() {
    let original = std::env::current_dir().unwrap();
    let workspace = Workspace::new();
    let config = Config {
        dir: Some(workspace.root.path().to_path_buf()),
        ..Config::default()
    };

    let result = Service::with_loader(config, "state", Box::new(loader()));
    let cwd = std::env::current_dir().unwrap();
    std::env::set_current_dir(&original).unwrap();

    assert!(result.is_ok());
    assert_eq!(
        cwd.canonicalize().unwrap(),
        workspace.root.path().canonicalize().unwrap()
    );
    assert!(workspace.root.path().join("state").is_dir());
    assert!(workspace.root.path().join("build").is_dir());
}

#[test]
#[serial]
fn test_missing_working_directory_fails_startup() {
    let workspace = Workspace::new();
    let config = Config {
        dir: Some(workspace.root.path().join("absent")),
        ..Config::default()
    };

    assert!(matches!(
        Service::with_loader(config, "state", Box::new(loader())),
        Err(ServiceError::WorkingDirectory { .. })
    ));
}
