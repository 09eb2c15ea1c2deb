//! Router tree
//!
//! Scopes and routes registered by the composer, turned into an axum
//! `Router` once composition is complete. A scope carries a path prefix and
//! the handler chain its routes inherit; a child scope extends both.

use crate::routing::error::{RoutingError, RoutingResult};
use crate::routing::handler::{run_chain, Context, Handler};
use crate::routing::method::HttpMethod;
use axum::body::Body;
use axum::extract::{Path, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::{on, MethodRouter};
use axum::Router;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Largest request body handed to a handler chain
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Handle to a scope in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// What the router reports when a handler panics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicRecord {
    pub method: String,
    pub path: String,
    pub message: String,
}

impl fmt::Display for PanicRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.method, self.path, self.message)
    }
}

/// Receives every recovered handler panic
pub type PanicHook = Arc<dyn Fn(&PanicRecord) + Send + Sync>;

struct Scope {
    prefix: String,
    chain: Vec<Handler>,
}

struct RouteEntry {
    method: HttpMethod,
    path: String,
    chain: Vec<Handler>,
}

pub struct RouterTree {
    scopes: Vec<Scope>,
    routes: Vec<RouteEntry>,
    registered: HashSet<(HttpMethod, String)>,
    panic_hook: Option<PanicHook>,
}

impl Default for RouterTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RouterTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterTree")
            .field("scopes", &self.scopes.len())
            .field("routes", &self.routes())
            .finish()
    }
}

impl RouterTree {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                prefix: String::new(),
                chain: Vec::new(),
            }],
            routes: Vec::new(),
            registered: HashSet::new(),
            panic_hook: None,
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Create a sub-scope of `parent`
    pub fn group(&mut self, parent: ScopeId, path: &str, handlers: Vec<Handler>) -> ScopeId {
        let parent = &self.scopes[parent.0];
        let prefix = join_path(&parent.prefix, path);
        let mut chain = parent.chain.clone();
        chain.extend(handlers);

        self.scopes.push(Scope { prefix, chain });
        ScopeId(self.scopes.len() - 1)
    }

    /// Full path prefix of a scope
    pub fn prefix(&self, scope: ScopeId) -> &str {
        let prefix = &self.scopes[scope.0].prefix;
        if prefix.is_empty() {
            "/"
        } else {
            prefix
        }
    }

    /// Register a route under `scope`; its chain runs after the scope's
    pub fn handle(
        &mut self,
        scope: ScopeId,
        method: HttpMethod,
        path: &str,
        handlers: Vec<Handler>,
    ) -> RoutingResult<()> {
        let scope = &self.scopes[scope.0];
        let full = match join_path(&scope.prefix, path) {
            p if p.is_empty() => "/".to_string(),
            p => p,
        };
        if !self.registered.insert((method, full.clone())) {
            return Err(RoutingError::DuplicateRoute {
                method: method.to_string(),
                path: full,
            });
        }

        let mut chain = scope.chain.clone();
        chain.extend(handlers);
        log::debug!("Route {} {} ({} handlers)", method, full, chain.len());
        self.routes.push(RouteEntry {
            method,
            path: full,
            chain,
        });
        Ok(())
    }

    pub fn get(&mut self, scope: ScopeId, path: &str, handlers: Vec<Handler>) -> RoutingResult<()> {
        self.handle(scope, HttpMethod::Get, path, handlers)
    }

    pub fn put(&mut self, scope: ScopeId, path: &str, handlers: Vec<Handler>) -> RoutingResult<()> {
        self.handle(scope, HttpMethod::Put, path, handlers)
    }

    pub fn post(&mut self, scope: ScopeId, path: &str, handlers: Vec<Handler>) -> RoutingResult<()> {
        self.handle(scope, HttpMethod::Post, path, handlers)
    }

    pub fn delete(&mut self, scope: ScopeId, path: &str, handlers: Vec<Handler>) -> RoutingResult<()> {
        self.handle(scope, HttpMethod::Delete, path, handlers)
    }

    pub fn options(&mut self, scope: ScopeId, path: &str, handlers: Vec<Handler>) -> RoutingResult<()> {
        self.handle(scope, HttpMethod::Options, path, handlers)
    }

    pub fn set_panic_hook(&mut self, hook: PanicHook) {
        self.panic_hook = Some(hook);
    }

    /// Registered (method, path) pairs in registration order
    pub fn routes(&self) -> Vec<(HttpMethod, &str)> {
        self.routes
            .iter()
            .map(|r| (r.method, r.path.as_str()))
            .collect()
    }

    /// Build the axum router serving every registered route
    pub fn build(&self) -> RoutingResult<Router> {
        let mut by_path: BTreeMap<&str, MethodRouter> = BTreeMap::new();
        for route in &self.routes {
            let chain = Arc::new(route.chain.clone());
            let hook = self.panic_hook.clone();
            let endpoint = move |params: Option<Path<HashMap<String, String>>>, request: Request| {
                dispatch(chain.clone(), hook.clone(), params, request)
            };
            let method_router = match by_path.remove(route.path.as_str()) {
                Some(existing) => existing.on(route.method.filter(), endpoint),
                None => on(route.method.filter(), endpoint),
            };
            by_path.insert(route.path.as_str(), method_router);
        }

        let mut router = Router::new();
        for (path, method_router) in by_path {
            // axum rejects malformed and conflicting paths by panicking
            router = catch_unwind(AssertUnwindSafe(move || router.route(path, method_router)))
                .map_err(|payload| RoutingError::InvalidPath {
                    path: path.to_string(),
                    reason: panic_message(payload.as_ref()),
                })?;
        }
        Ok(router)
    }
}

/// Join a scope prefix and a path with exactly one separator
fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        prefix.to_string()
    } else {
        format!("{}/{}", prefix, path)
    }
}

async fn dispatch(
    chain: Arc<Vec<Handler>>,
    hook: Option<PanicHook>,
    params: Option<Path<HashMap<String, String>>>,
    request: Request,
) -> HttpResponse {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            log::debug!("Rejected request body for {}: {}", parts.uri.path(), e);
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let mut ctx = Context::new(parts.method.clone(), parts.uri.path())
        .with_query(parts.uri.query().map(str::to_string))
        .with_params(params.map(|Path(p)| p).unwrap_or_default())
        .with_headers(parts.headers)
        .with_body(body);

    match catch_unwind(AssertUnwindSafe(|| run_chain(&chain, &mut ctx))) {
        Ok(response) => response.into_response(),
        Err(payload) => {
            let record = PanicRecord {
                method: parts.method.to_string(),
                path: parts.uri.path().to_string(),
                message: panic_message(payload.as_ref()),
            };
            match &hook {
                Some(hook) => hook(&record),
                None => log::error!("Handler panicked: {}", record),
            }
            (StatusCode::INTERNAL_SERVER_ERROR, Body::from("Internal Server Error")).into_response()
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
