//! Route registration and the route table.
//!
//! A [`Route`] binds a method and path to a handler, its own middleware
//! stages, and per-route [`RouteOptions`]. The [`RouteTable`] stores
//! routes in the radix tree, so a match returns the full binding plus the
//! extracted path parameters.

use std::sync::Arc;

use http::Method;
use proteus_middleware::{BoxFuture, BoxedMiddleware, Request, RequestContext, Response};
use proteus_router::{InsertError, MethodRouter, Params, Router};
use thiserror::Error;

/// Errors returned by route handlers.
///
/// Handler errors never reach the client as-is; the dispatcher logs them
/// and responds with a generic 500.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A handler-specific failure.
    #[error("{0}")]
    Message(String),

    /// JSON encoding or decoding inside a handler failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HandlerError {
    /// Creates a handler error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// A route endpoint.
pub trait RouteHandler: Send + Sync {
    /// Handle a dispatched request.
    fn call(
        &self,
        ctx: RequestContext,
        request: Request,
    ) -> BoxFuture<'static, Result<Response, HandlerError>>;
}

impl<F, Fut> RouteHandler for F
where
    F: Fn(RequestContext, Request) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Response, HandlerError>> + Send + 'static,
{
    fn call(
        &self,
        ctx: RequestContext,
        request: Request,
    ) -> BoxFuture<'static, Result<Response, HandlerError>> {
        Box::pin(self(ctx, request))
    }
}

/// Per-route options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteOptions {
    /// Skip the global body parser stage for this route.
    pub skip_body_parser: bool,
}

impl RouteOptions {
    /// Options that skip the global body parser.
    #[must_use]
    pub fn skip_body_parser() -> Self {
        Self {
            skip_body_parser: true,
        }
    }
}

/// One registered route.
pub struct Route {
    /// The HTTP method this route answers.
    pub method: Method,
    /// The route pattern, e.g. `/users/{id}`.
    pub path: String,
    /// Middleware stages that run after the global pipeline.
    pub stages: Vec<BoxedMiddleware>,
    /// The terminal handler.
    pub handler: Arc<dyn RouteHandler>,
    /// Per-route options.
    pub options: RouteOptions,
}

impl Route {
    /// Creates a route with no extra stages and default options.
    pub fn new(method: Method, path: impl Into<String>, handler: Arc<dyn RouteHandler>) -> Self {
        Self {
            method,
            path: path.into(),
            stages: Vec::new(),
            handler,
            options: RouteOptions::default(),
        }
    }

    /// Appends a route-scoped middleware stage.
    #[must_use]
    pub fn with_stage(mut self, stage: BoxedMiddleware) -> Self {
        self.stages.push(stage);
        self
    }

    /// Sets the per-route options.
    #[must_use]
    pub fn with_options(mut self, options: RouteOptions) -> Self {
        self.options = options;
        self
    }
}

/// A matched route plus its extracted path parameters.
pub struct MatchedRoute {
    /// The route binding.
    pub route: Arc<Route>,
    /// Parameters extracted from the path.
    pub params: Params,
}

/// The table of registered routes.
#[derive(Default)]
pub struct RouteTable {
    router: Router<Arc<Route>>,
}

impl RouteTable {
    /// Creates an empty route table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route.
    ///
    /// # Errors
    ///
    /// Returns [`InsertError::Conflict`] if the (method, path) pair is
    /// already bound, or [`InsertError::WildcardPosition`] for a wildcard
    /// that is not the final segment.
    pub fn register(&mut self, route: Route) -> Result<(), InsertError> {
        let method = route.method.clone();
        let path = route.path.clone();
        let route = Arc::new(route);
        self.router
            .insert(&path, MethodRouter::default().method(&method, route))
    }

    /// Matches a request against the table.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<MatchedRoute> {
        let matched = self.router.match_route(method, path)?;
        Some(MatchedRoute {
            route: Arc::clone(matched.endpoint),
            params: matched.params,
        })
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.router.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.router.is_empty()
    }
}
