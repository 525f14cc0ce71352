//! # Proteus Router
//!
//! Radix-tree route table for the Proteus server kit.
//!
//! The router is generic over the endpoint payload `T`, so a matched route
//! hands back whatever was registered for it (in the server crate that is
//! the route binding carrying middleware and handler). Matching follows
//! strict priority:
//!
//! 1. **Static segments** (e.g., `/users/me`)
//! 2. **Parameter segments** (e.g., `/users/{id}`)
//! 3. **Wildcard segments** (e.g., `/files/*path`)
//!
//! Registering the same (method, path) pair twice is an error, not a merge;
//! the route table is the single source of truth for what is bound where.
//!
//! ## Example
//!
//! ```
//! use proteus_router::{MethodRouter, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert("/users/{id}", MethodRouter::new().get("getUser")).unwrap();
//!
//! let matched = router.match_route(&Method::GET, "/users/123").unwrap();
//! assert_eq!(*matched.endpoint, "getUser");
//! assert_eq!(matched.params.get("id"), Some("123"));
//! ```

#![forbid(unsafe_code)]

pub mod method_router;
pub mod node;
pub mod params;
pub mod router;

pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::Router;

use http::Method;
use thiserror::Error;

/// Error returned when a route cannot be added to the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    /// The (method, path) pair is already bound to an endpoint.
    #[error("route already registered: {method} {path}")]
    Conflict {
        /// The HTTP method of the duplicate registration.
        method: Method,
        /// The path pattern of the duplicate registration.
        path: String,
    },

    /// A wildcard segment appeared before the end of the pattern.
    #[error("wildcard segment must be the last segment: {path}")]
    WildcardPosition {
        /// The offending path pattern.
        path: String,
    },
}

/// The result of a successful route match.
///
/// Borrows the endpoint from the router and owns the extracted parameters.
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    /// The endpoint registered for the matched (method, path).
    pub endpoint: &'a T,

    /// Path parameters extracted during matching.
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(endpoint: &'a T, params: Params) -> Self {
        Self { endpoint, params }
    }
}
