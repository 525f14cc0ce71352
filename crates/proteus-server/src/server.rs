//! The server runtime.
//!
//! [`Server`] owns the shared state, the connection registry, and the
//! route table, and wires them together at serve time: the broadcaster is
//! installed as the state's sink, HTTP requests flow through the
//! [`RequestDispatcher`], and requests to an upgrade path that pass the
//! WebSocket handshake get a spawned sync session.
//!
//! # Example
//!
//! ```rust,ignore
//! use proteus_server::{Server, ServerConfig, StartConfig};
//! use proteus_state::{FieldKind, StateSchema};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = StateSchema::new()
//!         .field("count", FieldKind::Numeric, serde_json::json!(0));
//!
//!     let mut server = Server::new(ServerConfig::default(), schema);
//!     server.route(http::Method::GET, "/ping", |_ctx, _req| async {
//!         Ok(proteus_middleware::Response::new(Default::default()))
//!     })?;
//!
//!     server.run(StartConfig::new().port(3000)).await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use http::Method;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use proteus_middleware::{BoxedMiddleware, Middleware, Response as MwResponse, ResponseExt};
use proteus_router::InsertError;
use proteus_state::{Dispatcher, SharedState, StateError, StateSchema, StateSink};
use proteus_ws::{
    complete_upgrade, is_websocket_request, prepare_upgrade, run_sync_session, Broadcaster,
    FrameHook, Registry, RegistryStats,
};
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::{ServerConfig, StartConfig};
use crate::dispatch::RequestDispatcher;
use crate::logging;
use crate::routes::{Route, RouteHandler, RouteTable};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Errors from running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address could not be bound.
    #[error("bind error: {0}")]
    Bind(String),

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An in-process request server with a synchronized shared state.
pub struct Server {
    config: ServerConfig,
    stages: Vec<BoxedMiddleware>,
    routes: RouteTable,
    state: SharedState,
    registry: Arc<Registry>,
}

impl Server {
    /// Creates a server over a state schema.
    ///
    /// The broadcaster is wired as the state's sink immediately, so
    /// server-side mutations made before `run` already fan out once
    /// connections exist.
    #[must_use]
    pub fn new(config: ServerConfig, schema: StateSchema) -> Self {
        let state = SharedState::new(schema);
        let registry = Arc::new(Registry::new());
        let broadcaster: Arc<dyn StateSink> =
            Arc::new(Broadcaster::new(Arc::clone(&registry)));
        state.set_sink(broadcaster);

        Self {
            config,
            stages: Vec::new(),
            routes: RouteTable::new(),
            state,
            registry,
        }
    }

    /// Registers a route from a method, path, and handler.
    ///
    /// # Errors
    ///
    /// Returns [`InsertError::Conflict`] if the (method, path) pair is
    /// already bound.
    pub fn route<H>(&mut self, method: Method, path: &str, handler: H) -> Result<(), InsertError>
    where
        H: RouteHandler + 'static,
    {
        self.routes
            .register(Route::new(method, path, Arc::new(handler)))
    }

    /// Registers a fully built [`Route`] (per-route stages, options).
    pub fn register(&mut self, route: Route) -> Result<(), InsertError> {
        self.routes.register(route)
    }

    /// Appends a global middleware stage; stages run in append order
    /// after the built-in CORS and body-limit stages.
    pub fn middleware<M: Middleware>(&mut self, stage: M) {
        self.stages.push(Arc::new(stage));
    }

    /// The shared state handle.
    #[must_use]
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// A typed dispatcher for one state field.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownField`] if the field is not declared.
    pub fn dispatcher(&self, key: &str) -> Result<Dispatcher, StateError> {
        self.state.dispatcher(key)
    }

    /// Registers an observer for one state field.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownField`] if the field is not declared.
    pub fn on_state_change<F>(&self, key: &str, observer: F) -> Result<(), StateError>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.state.on_change(key, observer)
    }

    /// The connection registry handle.
    #[must_use]
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Statistics about the connection registry.
    #[must_use]
    pub fn registry_stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Runs the server until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn run(self, start: StartConfig) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(start, shutdown).await
    }

    /// Runs the server with a caller-controlled shutdown signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn run_with_shutdown(
        self,
        start: StartConfig,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        logging::init(start.is_verbose());

        let addr = start.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind(format!("failed to bind to {addr}: {e}")))?;

        self.serve(listener, start, shutdown).await
    }

    /// Serves connections from an already bound listener.
    ///
    /// Useful for tests that bind to an ephemeral port first.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting fails irrecoverably.
    pub async fn serve(
        self,
        listener: TcpListener,
        start: StartConfig,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let shutdown_timeout = self.config.shutdown_timeout();
        let inner = Arc::new(ServerInner {
            dispatcher: RequestDispatcher::new(&self.config, self.stages, self.routes),
            state: self.state,
            registry: self.registry,
            upgrade_paths: self.config.upgrade_paths().to_vec(),
            on_frame: start.frame_hook(),
        });

        if let Ok(addr) = listener.local_addr() {
            info!("server listening on {}", addr);
        }

        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let inner = Arc::clone(&inner);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = inner.handle_connection(stream, shutdown).await {
                                    debug!("connection error from {}: {}", remote_addr, e);
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            error!("failed to accept connection: {}", e);
                        }
                    }
                }

                _ = shutdown.recv() => {
                    info!("shutdown signal received, stopping server");
                    break;
                }
            }
        }

        info!(
            "waiting up to {:?} for {} connections to close",
            shutdown_timeout,
            tracker.active_connections()
        );

        tokio::select! {
            _ = tracker.wait_for_shutdown() => {
                info!("all connections closed");
            }
            _ = tokio::time::sleep(shutdown_timeout) => {
                warn!(
                    "shutdown timeout reached, {} connections still active",
                    tracker.active_connections()
                );
            }
        }

        info!("server stopped");
        Ok(())
    }
}

/// The serve-time server: immutable wiring shared by every connection.
struct ServerInner {
    dispatcher: RequestDispatcher,
    state: SharedState,
    registry: Arc<Registry>,
    upgrade_paths: Vec<String>,
    on_frame: Option<FrameHook>,
}

impl ServerInner {
    async fn handle_connection(
        self: Arc<Self>,
        stream: tokio::net::TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let inner = Arc::clone(&self);

        let service = service_fn(move |req: hyper::Request<Incoming>| {
            let inner = Arc::clone(&inner);
            async move { inner.handle_request(req).await }
        });

        let conn = http1::Builder::new()
            .serve_connection(io, service)
            .with_upgrades();

        tokio::select! {
            result = conn => result,
            _ = shutdown.recv() => Ok(()),
        }
    }

    async fn handle_request(
        self: Arc<Self>,
        req: hyper::Request<Incoming>,
    ) -> Result<MwResponse, Infallible> {
        let path = req.uri().path().to_string();

        if self.upgrade_paths.iter().any(|p| p == &path) && is_websocket_request(&req) {
            return Ok(self.handle_upgrade(req));
        }

        let (parts, body) = req.into_parts();
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!("failed to read request body: {}", e);
                return Ok(MwResponse::json_error(
                    http::StatusCode::BAD_REQUEST,
                    "BODY_READ_ERROR",
                    "failed to read request body",
                ));
            }
        };

        let request = http::Request::from_parts(parts, Full::new(bytes));
        Ok(self.dispatcher.dispatch(request).await)
    }

    /// Answers the handshake and spawns the sync session once hyper
    /// hands over the raw connection.
    fn handle_upgrade(self: Arc<Self>, req: hyper::Request<Incoming>) -> MwResponse {
        let upgrade = prepare_upgrade(&req);
        if !upgrade.accepted {
            return upgrade.response;
        }

        let inner = Arc::clone(&self);
        tokio::spawn(async move {
            match hyper::upgrade::on(req).await {
                Ok(upgraded) => {
                    let ws = complete_upgrade(TokioIo::new(upgraded)).await;
                    run_sync_session(
                        ws,
                        inner.state.clone(),
                        Arc::clone(&inner.registry),
                        inner.on_frame.clone(),
                    )
                    .await;
                }
                Err(e) => {
                    warn!("websocket upgrade failed: {}", e);
                }
            }
        });

        upgrade.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use proteus_middleware::{Request, RequestContext};
    use proteus_state::FieldKind;
    use serde_json::json;
    use std::time::Duration;

    fn test_schema() -> StateSchema {
        StateSchema::new().field("count", FieldKind::Numeric, json!(0))
    }

    fn ok_handler(
        _ctx: RequestContext,
        _req: Request,
    ) -> impl std::future::Future<Output = Result<MwResponse, crate::routes::HandlerError>> + Send
    {
        async {
            Ok(http::Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::new()))
                .unwrap())
        }
    }

    #[test]
    fn test_duplicate_route_is_rejected() {
        let mut server = Server::new(ServerConfig::default(), test_schema());
        server.route(Method::GET, "/ping", ok_handler).unwrap();
        let err = server.route(Method::GET, "/ping", ok_handler).unwrap_err();
        assert!(matches!(err, InsertError::Conflict { .. }));
    }

    #[test]
    fn test_dispatcher_for_unknown_field() {
        let server = Server::new(ServerConfig::default(), test_schema());
        assert!(server.dispatcher("missing").is_err());
        assert!(server.dispatcher("count").is_ok());
    }

    #[test]
    fn test_server_side_mutation_via_dispatcher() {
        let server = Server::new(ServerConfig::default(), test_schema());
        server
            .dispatcher("count")
            .unwrap()
            .as_numeric()
            .unwrap()
            .increment_by(3.0);
        assert_eq!(server.state().get("count"), Some(json!(3)));
    }

    #[tokio::test]
    async fn test_run_with_shutdown_invalid_address() {
        let server = Server::new(ServerConfig::default(), test_schema());
        let start = StartConfig::new().host("definitely not a host");
        let result = server
            .run_with_shutdown(start, ShutdownSignal::new())
            .await;
        assert!(matches!(result, Err(ServerError::Bind(_))));
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = Server::new(ServerConfig::default(), test_schema());

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            server.serve(listener, StartConfig::new(), shutdown),
        )
        .await;

        assert!(result.is_ok());
        assert!(result.unwrap().is_ok());
    }
}
