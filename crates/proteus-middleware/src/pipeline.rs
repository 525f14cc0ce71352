//! Ordered middleware pipeline.
//!
//! The pipeline is an explicit ordered stage list: the order stages are
//! added to the builder is the order they execute. A stage short-circuits
//! by returning a response without running its [`Next`] continuation.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a stage list.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An ordered middleware pipeline.
///
/// # Example
///
/// ```ignore
/// let pipeline = Pipeline::builder()
///     .stage(CorsMiddleware::permissive())
///     .stage(BodyLimitMiddleware::new(1024 * 1024))
///     .build();
///
/// let response = pipeline.process(ctx, request, handler).await;
/// ```
pub struct Pipeline {
    /// Pipeline stages in execution order
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Processes a request through the pipeline, then the handler.
    ///
    /// This is the main entry point for request processing.
    pub async fn process<H>(&self, mut ctx: RequestContext, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(&[], handler);
        next.run(&mut ctx, request).await
    }

    /// Processes a request through the pipeline plus per-route stages.
    ///
    /// The pipeline's own stages run first, then `route_stages` in order,
    /// then the handler. Used by the server dispatcher to append the
    /// middleware registered on the matched route.
    pub async fn process_with<H>(
        &self,
        route_stages: &[BoxedMiddleware],
        mut ctx: RequestContext,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(route_stages, handler);
        next.run(&mut ctx, request).await
    }

    /// Builds the middleware chain from back to front.
    fn build_chain<'a, H>(&'a self, route_stages: &'a [BoxedMiddleware], handler: H) -> Next<'a>
    where
        H: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler(handler);

        for middleware in route_stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }

        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }

        next
    }

    /// Returns the names of all stages in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates a new empty pipeline builder.
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a middleware stage.
    ///
    /// Stages execute in the order they are added.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already-boxed middleware stage.
    #[must_use]
    pub fn boxed_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}
