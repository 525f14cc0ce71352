//! # Proteus
//!
//! **An in-process request server with a broadcast-synchronized shared state.**
//!
//! Proteus combines two engines behind one server type:
//!
//! - An HTTP dispatch pipeline: a radix-tree route table, an ordered
//!   middleware pipeline with built-in CORS / body-limit / body-parser
//!   stages, and a single error boundary that turns handler errors and
//!   panics into logged 500s.
//! - A state synchronization engine: one schema-declared shared state
//!   object whose every accepted mutation is broadcast, as a full
//!   snapshot, to all streaming WebSocket clients.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use proteus::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = StateSchema::new()
//!         .field("count", FieldKind::Numeric, serde_json::json!(0))
//!         .field("users", FieldKind::Collection, serde_json::json!([]));
//!
//!     let mut server = Server::new(ServerConfig::default(), schema);
//!
//!     let counter = server.dispatcher("count")?.try_numeric()?.clone();
//!     server.route(http::Method::POST, "/count/bump", move |_ctx, _req| {
//!         let counter = counter.clone();
//!         async move {
//!             counter.increment();
//!             Ok(Response::json(http::StatusCode::OK, &serde_json::json!({"ok": true})))
//!         }
//!     })?;
//!
//!     server.run(StartConfig::new().port(3000)).await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/proteus/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export server types
pub use proteus_server as server;

// Re-export middleware types
pub use proteus_middleware as middleware;

// Re-export router types
pub use proteus_router as router;

// Re-export state types
pub use proteus_state as state;

// Re-export WebSocket types
pub use proteus_ws as ws;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use proteus::prelude::*;
/// ```
pub mod prelude {
    pub use proteus_server::{
        HandlerError, Route, RouteHandler, RouteOptions, Server, ServerConfig, ServerError,
        ShutdownSignal, StartConfig,
    };

    // Re-export pipeline types
    pub use proteus_middleware::{
        Middleware, Next, Pipeline, PipelineBuilder, Request, RequestContext, Response,
        ResponseExt,
    };

    // Re-export built-in stages
    pub use proteus_middleware::stages::{
        AllowedOrigins, BodyLimitMiddleware, BodyParserMiddleware, CorsBuilder, CorsMiddleware,
    };

    // Re-export router types
    pub use proteus_router::{InsertError, Params, Router};

    // Re-export state types
    pub use proteus_state::{
        CollectionOps, Dispatcher, FieldKind, NumericOps, ObjectOps, ScalarOps, SharedState,
        StateError, StateSchema, StateSink,
    };

    // Re-export WebSocket types
    pub use proteus_ws::{
        CloseCode, CloseFrame, ConnectionHandle, ConnectionId, Message, Registry, RegistryStats,
        SyncMessage, WsError, WsResult,
    };
}
