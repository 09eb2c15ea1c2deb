//! Route and group composition through the service

use crate::common::{parse_config, send, Workspace, TOKEN};
use axum::http::{Method, StatusCode};
use plugserve::routing::api::RoutingError;
use plugserve::service::api::ServiceError;

const API: &str = r#"
plugins = ["github.com/acme/auth@v1", "github.com/acme/users#pg", "github.com/acme/audit"]

[[group]]
name = "api"
path = "/api"
handlers = ["audit.Log"]

[[group]]
name = "private"
path = "/private"
group = "api"
handlers = ["auth.Check"]

[[route]]
path = "/users"
group = "api"
handlers = ["users.List"]

[[route]]
method = "post"
path = "/users"
group = "api"
handlers = ["users.Create"]

[[route]]
path = "/users/:id"
group = "api"
handlers = ["users.Get"]

[[route]]
path = "/me"
group = "private"
handlers = ["users.Whoami"]

[[route]]
method = "delete"
path = "/ping"
"#;

#[tokio::test]
async fn test_routes_are_served_with_group_prefixes() {
    let workspace = Workspace::new();
    let service = workspace.service(parse_config(API)).unwrap();
    let router = service.router();

    let (status, body) = send(router.clone(), Method::GET, "/api/users", &[], "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"["alice","bob"]"#);

    let (status, body) = send(router.clone(), Method::POST, "/api/users", &[], "carol").await;
    assert_eq!((status, body.as_str()), (StatusCode::CREATED, "carol"));

    let (_, body) = send(router.clone(), Method::GET, "/api/users/42", &[], "").await;
    assert_eq!(body, "user 42");

    let (status, _) = send(router, Method::DELETE, "/ping", &[], "").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_group_handlers_guard_nested_routes() {
    let workspace = Workspace::new();
    let service = workspace.service(parse_config(API)).unwrap();
    let router = service.router();

    let (status, _) = send(router.clone(), Method::GET, "/api/private/me", &[], "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        router,
        Method::GET,
        "/api/private/me",
        &[("x-token", TOKEN)],
        "",
    )
    .await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "alice"));
}

#[tokio::test]
async fn test_require_filter_restricts_activation() {
    let workspace = Workspace::new();
    let mut config = parse_config(
        r#"
plugins = ["auth", "users"]

[flags]
require = "auth"

[[group]]
name = "mixed"
path = "/mixed"
handlers = ["auth.Check", "users.List"]

[[route]]
path = "/both"
handlers = ["auth.Check", "users.List"]

[[route]]
path = "/open"
group = "mixed"
"#,
    );
    config.environment.insert("USERS_DB".to_string(), String::new());
    let service = workspace.service(config).unwrap();

    // `users` is never loaded, so its failing OnInit never runs
    assert!(service.registry().get("users").is_err());

    let router = service.router();
    let (status, _) = send(router.clone(), Method::GET, "/both", &[], "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(router.clone(), Method::GET, "/mixed/open", &[], "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(router, Method::GET, "/mixed/open", &[("x-token", TOKEN)], "").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_unresolved_handlers_fail_startup_with_route_index() {
    let workspace = Workspace::new();
    let config = parse_config(
        r#"
plugins = ["users"]

[[route]]
path = "/ok"
handlers = ["users.List"]

[[route]]
path = "/broken"
handlers = ["users.Missing"]

[[route]]
path = "/ghost"
handlers = ["ghost.Handler"]
"#,
    );

    let err = workspace.service(config).unwrap_err();
    match &err {
        ServiceError::InitRoutes(routing) => {
            assert_eq!(routing.route_indices(), vec![1, 2]);
            assert!(matches!(routing, RoutingError::Routes { .. }));
        }
        other => panic!("expected route initialization error, got {:?}", other),
    }
    let message = err.to_string();
    assert!(message.starts_with("error initializing routes: "), "got: {}", message);
    assert!(message.contains("route #1"), "got: {}", message);
}

#[tokio::test]
async fn test_handler_panic_is_recovered_and_logged() {
    let workspace = Workspace::new();
    let config = parse_config(
        r#"
plugins = ["users"]

[[route]]
path = "/boom"
handlers = ["users.Panic"]

[[route]]
path = "/users"
handlers = ["users.List"]
"#,
    );
    let service = workspace.service(config).unwrap();
    let router = service.router();

    let (status, _) = send(router.clone(), Method::GET, "/boom", &[], "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let (status, _) = send(router, Method::GET, "/users", &[], "").await;
    assert_eq!(status, StatusCode::OK);

    service.close().unwrap();
    let log = std::fs::read_to_string(workspace.data_dir().join("panic.log")).unwrap();
    assert!(log.contains("GET /boom users handler exploded"), "got: {}", log);
}
