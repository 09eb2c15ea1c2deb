//! HTTP to HTTPS upgrader
//!
//! When both ports are configured the plain HTTP listener serves only this
//! router, which permanently redirects every request to the HTTPS port.

use axum::extract::Request;
use axum::http::header::HOST;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Router;

const DEFAULT_HTTPS_PORT: u16 = 443;

pub fn upgrader(tls_port: u16) -> Router {
    Router::new().fallback(move |request: Request| async move { upgrade(&request, tls_port) })
}

fn upgrade(request: &Request, tls_port: u16) -> Response {
    let Some(host) = request.headers().get(HOST).and_then(|h| h.to_str().ok()) else {
        return (StatusCode::BAD_REQUEST, "missing Host header").into_response();
    };
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or("/");
    Redirect::permanent(&https_location(host, tls_port, path)).into_response()
}

/// `https://` URL for `host` (any port stripped) on `tls_port`
fn https_location(host: &str, tls_port: u16, path_and_query: &str) -> String {
    let hostname = match host.strip_prefix('[') {
        // IPv6 literal
        Some(rest) => rest
            .split_once(']')
            .map(|(addr, _)| &host[..addr.len() + 2])
            .unwrap_or(host),
        None => host.rsplit_once(':').map(|(h, _)| h).unwrap_or(host),
    };
    if tls_port == DEFAULT_HTTPS_PORT {
        format!("https://{}{}", hostname, path_and_query)
    } else {
        format!("https://{}:{}{}", hostname, tls_port, path_and_query)
    }
}
