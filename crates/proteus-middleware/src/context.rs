//! Request context.
//!
//! The [`RequestContext`] flows through the middleware pipeline to the
//! handler. Stages enrich it (the body parser attaches the parsed body,
//! the dispatcher attaches path parameters) and the handler reads it.

use proteus_router::Params;
use serde_json::Value;
use std::time::Instant;
use uuid::Uuid;

/// Context that flows through the middleware pipeline to the handler.
///
/// # Example
///
/// ```
/// use proteus_middleware::context::RequestContext;
///
/// let mut ctx = RequestContext::new();
/// ctx.set_parsed_body(serde_json::json!({"name": "alice"}));
///
/// assert_eq!(ctx.parsed_body().unwrap()["name"], "alice");
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request (UUID v7).
    request_id: Uuid,

    /// Path parameters extracted by the router.
    params: Params,

    /// Body parsed by the body-parser stage, if any.
    parsed_body: Option<Value>,

    /// When the request started processing.
    started_at: Instant,
}

impl RequestContext {
    /// Creates a new request context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: Uuid::now_v7(),
            params: Params::new(),
            parsed_body: None,
            started_at: Instant::now(),
        }
    }

    /// Creates a context carrying the given path parameters.
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            params,
            parsed_body: None,
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the path parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Replaces the path parameters.
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Returns the parsed request body, if the body-parser stage ran.
    #[must_use]
    pub fn parsed_body(&self) -> Option<&Value> {
        self.parsed_body.as_ref()
    }

    /// Attaches the parsed request body.
    ///
    /// This should only be called by the body-parser stage.
    pub fn set_parsed_body(&mut self, body: Value) {
        self.parsed_body = Some(body);
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
