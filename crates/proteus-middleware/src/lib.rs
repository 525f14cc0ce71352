//! # Proteus Middleware
//!
//! Ordered middleware pipeline for the Proteus server kit.
//!
//! Unlike frameworks with a fixed stage list, the pipeline here is an
//! explicit ordered sequence: composition order is execution order, and a
//! stage short-circuits by returning a response without invoking [`Next`].
//!
//! ## Built-in Stages
//!
//! - [`stages::CorsMiddleware`] — preflight handling and response annotation
//! - [`stages::BodyLimitMiddleware`] — reject oversized request bodies (413)
//! - [`stages::BodyParserMiddleware`] — parse JSON / form bodies into the
//!   request context (400 on malformed input)
//!
//! ## Example
//!
//! ```
//! use proteus_middleware::pipeline::Pipeline;
//! use proteus_middleware::stages::BodyLimitMiddleware;
//!
//! let pipeline = Pipeline::builder()
//!     .stage(BodyLimitMiddleware::new(1024 * 1024))
//!     .build();
//!
//! assert_eq!(pipeline.stage_names(), vec!["body_limit"]);
//! ```

#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use context::RequestContext;
pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use types::{Request, Response, ResponseExt};
