//! The request dispatcher.
//!
//! Composes the global pipeline, the matched route's stages, and the
//! handler into one future per request, and puts the single error
//! boundary around it: handler errors and panics from any stage become a
//! logged generic 500 and never propagate to the transport.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use http::StatusCode;
use proteus_middleware::stages::{BodyLimitMiddleware, BodyParserMiddleware};
use proteus_middleware::{
    BoxedMiddleware, Pipeline, PipelineBuilder, Request, RequestContext, Response, ResponseExt,
};
use tracing::{debug, error};

use crate::config::ServerConfig;
use crate::routes::RouteTable;

/// Dispatches requests through the pipeline to route handlers.
pub struct RequestDispatcher {
    pipeline: Pipeline,
    parser: Option<BoxedMiddleware>,
    routes: RouteTable,
}

impl RequestDispatcher {
    /// Builds a dispatcher from the server configuration, user stages,
    /// and the route table.
    ///
    /// Stage order is fixed: CORS, body-size limit, user stages, then
    /// (per route, unless skipped) the body parser, the route's own
    /// stages, and the handler.
    #[must_use]
    pub fn new(config: &ServerConfig, stages: Vec<BoxedMiddleware>, routes: RouteTable) -> Self {
        let mut builder = PipelineBuilder::new();
        if let Some(cors) = config.cors() {
            builder = builder.boxed_stage(Arc::clone(cors) as BoxedMiddleware);
        }
        builder = builder.stage(BodyLimitMiddleware::new(config.max_body_size()));
        for stage in stages {
            builder = builder.boxed_stage(stage);
        }

        let parser = config
            .enable_body_parser()
            .then(|| Arc::new(BodyParserMiddleware) as BoxedMiddleware);

        Self {
            pipeline: builder.build(),
            parser,
            routes,
        }
    }

    /// The route table behind this dispatcher.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Dispatches one request to a response.
    ///
    /// An unmatched request gets a 404 with no side effects. For a match,
    /// the composed future runs under `catch_unwind`; a panic anywhere in
    /// the pipeline or handler is logged and mapped to a 500.
    pub async fn dispatch(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let Some(matched) = self.routes.find(&method, &path) else {
            debug!(%method, path, "no route matched");
            return Response::json_error(
                StatusCode::NOT_FOUND,
                "ROUTE_NOT_FOUND",
                &format!("no route matches {method} {path}"),
            );
        };

        let route = matched.route;
        let ctx = RequestContext::with_params(matched.params);

        let mut route_stages: Vec<BoxedMiddleware> = Vec::new();
        if let Some(parser) = &self.parser {
            if !route.options.skip_body_parser {
                route_stages.push(Arc::clone(parser));
            }
        }
        route_stages.extend(route.stages.iter().map(Arc::clone));

        let handler = Arc::clone(&route.handler);
        let route_path = route.path.clone();
        let terminal = move |ctx: &mut RequestContext, request: Request| {
            let handler = Arc::clone(&handler);
            let ctx = ctx.clone();
            let fut: proteus_middleware::BoxFuture<'static, Response> = Box::pin(async move {
                match handler.call(ctx, request).await {
                    Ok(response) => response,
                    Err(e) => {
                        error!(path = route_path, error = %e, "handler failed");
                        internal_error()
                    }
                }
            });
            fut
        };

        let fut = self
            .pipeline
            .process_with(&route_stages, ctx, request, terminal);

        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(response) => response,
            Err(_) => {
                error!(%method, path, "request processing panicked");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    Response::json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "internal server error",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{HandlerError, Route, RouteHandler, RouteOptions};
    use bytes::Bytes;
    use http::Method;
    use http_body_util::Full;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(method: Method, path: &str, body: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(path)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    fn ok_handler() -> Arc<dyn RouteHandler> {
        Arc::new(|_ctx: RequestContext, _req: Request| async {
            Ok(http::Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::from("ok")))
                .unwrap())
        })
    }

    fn dispatcher_with(routes: Vec<Route>) -> RequestDispatcher {
        let mut table = RouteTable::new();
        for route in routes {
            table.register(route).unwrap();
        }
        RequestDispatcher::new(&ServerConfig::default(), Vec::new(), table)
    }

    #[tokio::test]
    async fn test_dispatch_matched_route() {
        let dispatcher = dispatcher_with(vec![Route::new(Method::GET, "/ping", ok_handler())]);
        let response = dispatcher.dispatch(request(Method::GET, "/ping", "")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dispatch_no_match_is_404_without_side_effects() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_probe = Arc::clone(&calls);
        let handler: Arc<dyn RouteHandler> =
            Arc::new(move |_ctx: RequestContext, _req: Request| {
                calls_probe.fetch_add(1, Ordering::SeqCst);
                async {
                    Ok(http::Response::builder()
                        .status(StatusCode::OK)
                        .body(Full::new(Bytes::new()))
                        .unwrap())
                }
            });

        let dispatcher = dispatcher_with(vec![Route::new(Method::GET, "/known", handler)]);
        let response = dispatcher
            .dispatch(request(Method::GET, "/unknown", ""))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_handler_error_becomes_500() {
        let handler: Arc<dyn RouteHandler> =
            Arc::new(|_ctx: RequestContext, _req: Request| async {
                Err(HandlerError::msg("database unreachable"))
            });

        let dispatcher = dispatcher_with(vec![Route::new(Method::GET, "/fail", handler)]);
        let response = dispatcher.dispatch(request(Method::GET, "/fail", "")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_dispatch_handler_panic_becomes_500() {
        let handler: Arc<dyn RouteHandler> =
            Arc::new(|_ctx: RequestContext, _req: Request| async {
                let outcome: Result<Response, HandlerError> =
                    Err(HandlerError::msg("handler bug"));
                assert!(outcome.is_ok(), "handler bug");
                outcome
            });

        let dispatcher = dispatcher_with(vec![Route::new(Method::GET, "/panic", handler)]);
        let response = dispatcher
            .dispatch(request(Method::GET, "/panic", ""))
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_dispatch_parses_json_body() {
        let handler: Arc<dyn RouteHandler> =
            Arc::new(|ctx: RequestContext, _req: Request| async move {
                let parsed = ctx.parsed_body().cloned().unwrap_or(serde_json::Value::Null);
                Ok(Response::json(StatusCode::OK, &parsed))
            });

        let dispatcher = dispatcher_with(vec![Route::new(Method::POST, "/echo", handler)]);
        let response = dispatcher
            .dispatch(request(Method::POST, "/echo", r#"{"name":"ada"}"#))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"name": "ada"}));
    }

    #[tokio::test]
    async fn test_dispatch_skip_body_parser_route() {
        let handler: Arc<dyn RouteHandler> =
            Arc::new(|ctx: RequestContext, _req: Request| async move {
                assert!(ctx.parsed_body().is_none());
                Ok(http::Response::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::new()))
                    .unwrap())
            });

        let route = Route::new(Method::POST, "/raw", handler)
            .with_options(RouteOptions::skip_body_parser());
        let dispatcher = dispatcher_with(vec![route]);
        let response = dispatcher
            .dispatch(request(Method::POST, "/raw", r#"{"name":"ada"}"#))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dispatch_body_over_limit_is_413() {
        let mut table = RouteTable::new();
        table
            .register(Route::new(Method::POST, "/upload", ok_handler()))
            .unwrap();
        let config = ServerConfig::builder().max_body_size(4).build();
        let dispatcher = RequestDispatcher::new(&config, Vec::new(), table);

        let response = dispatcher
            .dispatch(request(Method::POST, "/upload", "way past the limit"))
            .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_dispatch_path_params_reach_handler() {
        let handler: Arc<dyn RouteHandler> =
            Arc::new(|ctx: RequestContext, _req: Request| async move {
                let id = ctx.params().get("id").unwrap_or("").to_string();
                Ok(Response::json(StatusCode::OK, &json!({ "id": id })))
            });

        let dispatcher = dispatcher_with(vec![Route::new(Method::GET, "/users/{id}", handler)]);
        let response = dispatcher
            .dispatch(request(Method::GET, "/users/42", ""))
            .await;

        let body = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"id": "42"}));
    }
}
