//! Request body parser middleware.
//!
//! Parses `application/json` bodies into a `serde_json::Value` and
//! `application/x-www-form-urlencoded` bodies into a JSON object of string
//! fields, attaching the result to the request context. A body that fails
//! to parse produces a terminal 400 JSON error. Content types this stage
//! does not understand pass through unparsed.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::{BodyExt, Full};
use serde_json::Value;

/// Middleware that parses request bodies into the request context.
///
/// Runs after the CORS and body-limit stages so rejected requests never
/// have their bodies touched.
#[derive(Debug, Clone, Default)]
pub struct BodyParserMiddleware;

impl BodyParserMiddleware {
    /// Creates a new body parser middleware.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parses a form-urlencoded body into a JSON object of string fields.
    fn parse_form(bytes: &[u8]) -> Value {
        let mut object = serde_json::Map::new();
        for (key, value) in url::form_urlencoded::parse(bytes) {
            object.insert(key.into_owned(), Value::String(value.into_owned()));
        }
        Value::Object(object)
    }
}

impl Middleware for BodyParserMiddleware {
    fn name(&self) -> &'static str {
        "body_parser"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let content_type = request
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();

            let (parts, body) = request.into_parts();
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            if !bytes.is_empty() {
                if content_type.starts_with("application/x-www-form-urlencoded") {
                    ctx.set_parsed_body(Self::parse_form(&bytes));
                } else if content_type.starts_with("application/json") || content_type.is_empty() {
                    match serde_json::from_slice::<Value>(&bytes) {
                        Ok(value) => ctx.set_parsed_body(value),
                        Err(err) => {
                            tracing::debug!(
                                request_id = %ctx.request_id(),
                                error = %err,
                                "rejecting unparseable request body"
                            );
                            return Response::json_error(
                                StatusCode::BAD_REQUEST,
                                "MALFORMED_BODY",
                                "Request body could not be parsed",
                            );
                        }
                    }
                }
            }

            let request = http::Request::from_parts(parts, Full::new(Bytes::from(bytes)));
            next.run(ctx, request).await
        })
    }
}
