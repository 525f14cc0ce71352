//! # Proteus Server
//!
//! The server runtime: configuration, route table, request dispatcher,
//! the hyper/tokio accept loop, and the WebSocket sync wiring.
//!
//! A [`Server`] is created over a [`proteus_state::StateSchema`]; HTTP
//! routes flow through the middleware pipeline and handler error
//! boundary, while requests to an upgrade path that pass the WebSocket
//! handshake become streaming sync sessions fed by the broadcaster.

#![forbid(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod logging;
pub mod routes;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder, StartConfig};
pub use dispatch::RequestDispatcher;
pub use routes::{HandlerError, MatchedRoute, Route, RouteHandler, RouteOptions, RouteTable};
pub use server::{Server, ServerError};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
