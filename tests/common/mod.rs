//! Common test utilities and helpers
//!
//! Built-in plugin modules standing in for shared libraries, plus helpers
//! to build services and drive their routers or listeners.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::Router;
use plugserve::config::api::{Config, Environment, Flags};
use plugserve::plugin::api::{
    downcast_export, BoxError, BuiltinLoader, InitEntry, PluginRegistrar, Plugins, Response,
};
use plugserve::service::api::{Service, ServiceResult};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

pub const TOKEN: &str = "secret";

fn auth_module() -> PluginRegistrar {
    let mut r = PluginRegistrar::new();
    r.handler("Check", |ctx| {
        if ctx.header("x-token") == Some(TOKEN) {
            ctx.put("user", "alice".to_string());
            None
        } else {
            Some(Response::text(StatusCode::UNAUTHORIZED, "unauthorized"))
        }
    })
    .export("Realm", "staff".to_string());
    r
}

fn users_init(_: &dyn Plugins, env: &Environment) -> Result<(), BoxError> {
    match env.get("USERS_DB") {
        Some(db) if db.is_empty() => Err("USERS_DB is empty".into()),
        _ => Ok(()),
    }
}

fn users_module() -> PluginRegistrar {
    let mut r = PluginRegistrar::new();
    r.handler("List", |_| {
        Some(Response::json(
            StatusCode::OK,
            &serde_json::json!(["alice", "bob"]),
        ))
    })
    .handler("Get", |ctx| {
        let id = ctx.param("id").unwrap_or("?").to_string();
        Some(Response::text(StatusCode::OK, format!("user {}", id)))
    })
    .handler("Create", |ctx| {
        let body = ctx.body_text().unwrap_or_default().to_string();
        Some(Response::text(StatusCode::CREATED, body))
    })
    .handler("Whoami", |ctx| {
        let user = ctx.get::<String>("user").cloned().unwrap_or_default();
        Some(Response::text(StatusCode::OK, user))
    })
    .handler("Panic", |_| panic!("users handler exploded"))
    .on_init(InitEntry::env_only(users_init));
    r
}

fn audit_init(plugins: &dyn Plugins, flags: &Flags, _: &Environment) -> Result<(), BoxError> {
    if flags.get("audit").map(String::as_str) != Some("strict") {
        return Ok(());
    }
    let realm = plugins.export("auth", "Realm")?;
    match downcast_export::<String>(realm) {
        Some(realm) if realm.as_str() == "staff" => Ok(()),
        _ => Err("unexpected auth realm".into()),
    }
}

fn audit_module() -> PluginRegistrar {
    let mut r = PluginRegistrar::new();
    r.handler("Log", |_| None)
        .on_init(InitEntry::flags_and_env(audit_init));
    r
}

/// Loader offering the `auth`, `users` and `audit` modules
pub fn loader() -> BuiltinLoader {
    BuiltinLoader::new()
        .with_module("auth", auth_module)
        .with_module("users", users_module)
        .with_module("audit", audit_module)
}

pub fn parse_config(text: &str) -> Config {
    Config::from_toml_str(text, Path::new("test.toml")).unwrap()
}

/// Scratch directory with `data/` and `build/` inside it
pub struct Workspace {
    pub root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
        }
    }

    pub fn data_dir(&self) -> std::path::PathBuf {
        self.root.path().join("data")
    }

    pub fn plugin_dir(&self) -> std::path::PathBuf {
        self.root.path().join("build")
    }

    /// Build a service over the built-in modules
    pub fn service(&self, mut config: Config) -> ServiceResult<Service> {
        config.plugin_dir = self.plugin_dir();
        Service::with_loader(config, self.data_dir(), Box::new(loader()))
    }
}

/// Send one request through a router
pub async fn send(
    router: Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&bytes).to_string())
}

pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Raw HTTP/1.1 GET over TCP, retrying until the listener is up.
/// Returns the full response text.
pub async fn raw_get(port: u16, path: &str) -> String {
    let mut stream = None;
    for _ in 0..50 {
        match tokio::net::TcpStream::connect(("127.0.0.1", port)).await {
            Ok(s) => {
                stream = Some(s);
                break;
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(50)).await,
        }
    }
    let mut stream = stream.expect("listener never came up");
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: 127.0.0.1:{}\r\nConnection: close\r\n\r\n",
        path, port
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).to_string()
}
