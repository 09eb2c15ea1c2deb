//! Public API for routing

pub use crate::routing::composer::{compose, Composer};
pub use crate::routing::error::{RoutingError, RoutingResult};
pub use crate::routing::handler::{run_chain, Context, Handler, HandlerFn, Response};
pub use crate::routing::method::HttpMethod;
pub use crate::routing::tree::{PanicHook, PanicRecord, RouterTree, ScopeId, MAX_BODY_BYTES};
