//! Request body size limit middleware.
//!
//! Rejects requests whose declared `Content-Length` exceeds the configured
//! maximum with a terminal 413 JSON error. Requests without a declared
//! length pass through; the server collects bodies into memory before
//! dispatch, so the declared length is the effective gate.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use http::{header, StatusCode};

/// Default maximum request body size: 2 MiB.
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Middleware that rejects oversized request bodies.
///
/// # Example
///
/// ```
/// use proteus_middleware::stages::BodyLimitMiddleware;
///
/// let limit = BodyLimitMiddleware::new(1024 * 1024);
/// assert_eq!(limit.max_bytes(), 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct BodyLimitMiddleware {
    max_bytes: usize,
}

impl BodyLimitMiddleware {
    /// Creates a new body limit middleware with the given maximum size.
    #[must_use]
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Returns the configured maximum body size in bytes.
    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Extracts the declared content length, if present and parseable.
    fn declared_length(request: &Request) -> Option<usize> {
        request
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

impl Default for BodyLimitMiddleware {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BODY_SIZE)
    }
}

impl Middleware for BodyLimitMiddleware {
    fn name(&self) -> &'static str {
        "body_limit"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if let Some(length) = Self::declared_length(&request) {
                if length > self.max_bytes {
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        declared = length,
                        max = self.max_bytes,
                        "rejecting oversized request body"
                    );
                    return Response::json_error(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        "PAYLOAD_TOO_LARGE",
                        "Request body exceeds the configured size limit",
                    );
                }
            }

            next.run(ctx, request).await
        })
    }
}
