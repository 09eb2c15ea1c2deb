//! Request handlers
//!
//! A handler receives a mutable request context and either answers the
//! request or lets the next handler in the chain run. Handlers exported by
//! a dynamically loaded plugin keep that plugin's library alive for as long
//! as they are reachable from the router.

use axum::body::Bytes;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Signature shared by every request handler
pub type HandlerFn = dyn Fn(&mut Context) -> Option<Response> + Send + Sync;

/// A callable request handler
#[derive(Clone)]
pub struct Handler {
    // Declared before `owner` so the closure is dropped before its library
    func: Arc<HandlerFn>,
    owner: Option<Arc<dyn Any + Send + Sync>>,
}

impl Handler {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&mut Context) -> Option<Response> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            owner: None,
        }
    }

    /// Tie the handler's lifetime to a resource it depends on
    pub(crate) fn with_owner(mut self, owner: Arc<dyn Any + Send + Sync>) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn call(&self, ctx: &mut Context) -> Option<Response> {
        (self.func)(ctx)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("owned", &self.owner.is_some())
            .finish()
    }
}

/// Run a chain in order until one handler answers.
/// A chain that produces no response answers `204 No Content`.
pub fn run_chain(chain: &[Handler], ctx: &mut Context) -> Response {
    chain
        .iter()
        .find_map(|handler| handler.call(ctx))
        .unwrap_or_else(|| Response::new(StatusCode::NO_CONTENT))
}

/// Per-request state handed to each handler in the chain
pub struct Context {
    method: Method,
    path: String,
    query: Option<String>,
    params: HashMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
    values: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            params: HashMap::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            values: HashMap::new(),
        }
    }

    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, without the leading `?`
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Value of a named path parameter (`/users/:id`)
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Header value, when present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Store a value for handlers later in the chain
    pub fn put<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Arc::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("params", &self.params)
            .field("body_len", &self.body.len())
            .field("values", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Response produced by a handler
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status)
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_body(body.into())
    }

    /// Serialize `value` as the JSON body; serialization failures answer 500
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status)
                .with_header("content-type", "application/json")
                .with_body(body),
            Err(e) => {
                log::error!("Failed to serialize JSON response: {}", e);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Add a header; invalid names or values are logged and ignored
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => log::warn!("Ignoring invalid response header {:?}: {:?}", name, value),
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.headers, self.body).into_response()
    }
}
