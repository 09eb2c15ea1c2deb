//! Listener supervision through the service

use crate::common::{free_port, parse_config, raw_get, Workspace};
use plugserve::server::api::ServerError;
use plugserve::service::api::ServiceError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const USERS: &str = r#"
plugins = ["users"]

[[route]]
path = "/users"
handlers = ["users.List"]
"#;

#[tokio::test]
async fn test_http_only_serves_routes_until_stopped() {
    let workspace = Workspace::new();
    let mut config = parse_config(USERS);
    config.port = free_port();
    let port = config.port;
    let service = Arc::new(workspace.service(config).unwrap());

    let serving = {
        let service = service.clone();
        tokio::spawn(async move { service.listen().await })
    };

    let response = raw_get(port, "/users").await;
    assert!(response.starts_with("HTTP/1.1 200"), "got: {}", response);
    assert!(response.contains(r#"["alice","bob"]"#), "got: {}", response);
    assert!(!serving.is_finished());
    serving.abort();
}

#[tokio::test]
async fn test_https_without_tls_dir_fails_promptly() {
    let workspace = Workspace::new();
    let mut config = parse_config(USERS);
    config.tls_port = free_port();
    let service = workspace.service(config).unwrap();

    let err = timeout(Duration::from_secs(5), service.listen())
        .await
        .expect("listen should return promptly");
    assert!(matches!(
        err,
        ServiceError::Listen(ServerError::InvalidTlsDirectory { .. })
    ));
    assert!(err.to_string().starts_with("listener terminated: "));
}

#[tokio::test]
async fn test_http_upgrades_while_https_fails() {
    let workspace = Workspace::new();
    let mut config = parse_config(USERS);
    config.port = free_port();
    config.tls_port = free_port();
    config.tls_dir = workspace.root.path().join("no-certs");
    let (port, tls_port) = (config.port, config.tls_port);
    let service = Arc::new(workspace.service(config).unwrap());

    let serving = {
        let service = service.clone();
        tokio::spawn(async move { service.listen().await })
    };

    let response = raw_get(port, "/users?page=2").await;
    assert!(response.starts_with("HTTP/1.1 308"), "got: {}", response);
    let expected = format!("https://127.0.0.1:{}/users?page=2", tls_port);
    assert!(
        response.to_ascii_lowercase().contains(&format!("location: {}", expected)),
        "got: {}",
        response
    );

    let err = timeout(Duration::from_secs(5), serving)
        .await
        .expect("https listener should fail")
        .unwrap();
    assert!(matches!(
        err,
        ServiceError::Listen(ServerError::TlsConfig { .. })
    ));
}

#[tokio::test]
async fn test_no_ports_means_no_listeners() {
    let workspace = Workspace::new();
    let service = workspace.service(parse_config(USERS)).unwrap();

    assert!(service.listen_all().await.is_empty());
}

#[tokio::test]
async fn test_no_ports_listen_blocks() {
    let workspace = Workspace::new();
    let service = workspace.service(parse_config(USERS)).unwrap();

    let result = timeout(Duration::from_millis(500), service.listen()).await;
    assert!(result.is_err(), "listen returned without any listener");
}

#[tokio::test]
async fn test_https_serves_routes_with_certificates() {
    let workspace = Workspace::new();
    let mut config = parse_config(USERS);
    config.tls_port = free_port();
    config.tls_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/tls");
    let tls_port = config.tls_port;
    let service = Arc::new(workspace.service(config).unwrap());

    let serving = {
        let service = service.clone();
        tokio::spawn(async move { service.listen().await })
    };

    // Self-signed fixture certificate
    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .build()
        .unwrap();
    let url = format!("https://127.0.0.1:{}/users", tls_port);
    let mut response = None;
    for _ in 0..50 {
        match client.get(&url).send().await {
            Ok(r) => {
                response = Some(r);
                break;
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(50)).await,
        }
    }
    let response = response.expect("https listener never answered");
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), r#"["alice","bob"]"#);
    assert!(!serving.is_finished());
    serving.abort();
}
