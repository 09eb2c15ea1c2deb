//! Configuration files and command line overrides

use crate::common::{send, Workspace};
use axum::http::{Method, StatusCode};
use clap::Parser;
use plugserve::app::cli::api::{resolve_config, Args};
use plugserve::config::api::ConfigError;
use plugserve::service::api::ServiceError;

const CONFIG: &str = r#"
plugins = ["github.com/acme/auth", "github.com/acme/users"]

[flags]
require = "auth"

[[group]]
name = "secure"
path = "/secure"
handlers = ["auth.Check"]

[[route]]
path = "/users"
group = "secure"
handlers = ["users.List"]

[[route]]
path = "/ping"
group = "secure"
"#;

fn args_for(workspace: &Workspace, extra: &[&str]) -> Args {
    let path = workspace.root.path().join("plugserve.toml");
    std::fs::write(&path, CONFIG).unwrap();
    let mut argv = vec![
        "plugserve".to_string(),
        "--config".to_string(),
        path.display().to_string(),
    ];
    argv.extend(extra.iter().map(|s| s.to_string()));
    Args::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn test_file_require_flag_filters_routes() {
    let workspace = Workspace::new();
    let config = resolve_config(&args_for(&workspace, &[])).await.unwrap();
    let service = workspace.service(config).unwrap();

    assert_eq!(service.registry().len(), 1);
    let (status, _) = send(service.router(), Method::GET, "/secure/users", &[], "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(service.router(), Method::GET, "/secure/ping", &[], "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_command_line_require_overrides_file() {
    let workspace = Workspace::new();
    let args = args_for(&workspace, &["--require", "auth,users", "--update"]);
    let config = resolve_config(&args).await.unwrap();
    assert!(config.perform_update);
    assert_eq!(config.flags["require"], "auth,users");

    let service = workspace.service(config).unwrap();
    assert_eq!(service.registry().len(), 2);
    let (status, body) = send(
        service.router(),
        Method::GET,
        "/secure/users",
        &[("x-token", crate::common::TOKEN)],
        "",
    )
    .await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, r#"["alice","bob"]"#));
}

#[tokio::test]
async fn test_invalid_configuration_is_reported() {
    let workspace = Workspace::new();
    let path = workspace.root.path().join("broken.toml");
    std::fs::write(&path, "[[route]]\npath = \"/x\"\nhandlers = [\"nodot\"]\n").unwrap();
    let args = Args::try_parse_from(["plugserve", "--config", path.to_str().unwrap()]).unwrap();

    let err = resolve_config(&args).await.unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {:?}", err);
    assert!(ServiceError::from(err).to_string().contains("broken.toml"));
}
