//! CORS (Cross-Origin Resource Sharing) middleware.
//!
//! Handles preflight OPTIONS requests terminally and annotates all other
//! responses with the configured CORS headers.
//!
//! ## Preflight Requests
//!
//! A request is a preflight when it is an OPTIONS request carrying both an
//! `Origin` and an `Access-Control-Request-Method` header. Preflights are
//! answered directly with 204 (or 403 when the origin, method, or headers
//! are rejected); the rest of the pipeline and the handler never run.
//!
//! ## Example
//!
//! ```
//! use proteus_middleware::stages::CorsMiddleware;
//! use http::Method;
//!
//! let cors = CorsMiddleware::builder()
//!     .allow_origin("https://app.example.com")
//!     .allow_methods([Method::GET, Method::POST])
//!     .allow_credentials(true)
//!     .build();
//! ```

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use http::{HeaderValue, Method, StatusCode};
use std::collections::HashSet;
use std::time::Duration;

/// CORS header names.
pub mod headers {
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// `Access-Control-Max-Age` header.
    pub const MAX_AGE: &str = "access-control-max-age";
    /// `Access-Control-Expose-Headers` header.
    pub const EXPOSE_HEADERS: &str = "access-control-expose-headers";
    /// `Access-Control-Request-Method` header (preflight).
    pub const REQUEST_METHOD: &str = "access-control-request-method";
    /// `Access-Control-Request-Headers` header (preflight).
    pub const REQUEST_HEADERS: &str = "access-control-request-headers";
    /// `Origin` header.
    pub const ORIGIN: &str = "origin";
    /// `Vary` header.
    pub const VARY: &str = "vary";
}

/// Represents the set of allowed origins.
#[derive(Debug, Clone)]
pub enum AllowedOrigins {
    /// Allow any origin (wildcard `*`).
    Any,
    /// Allow specific origins.
    List(HashSet<String>),
}

impl AllowedOrigins {
    /// Checks if an origin is allowed.
    #[must_use]
    pub fn is_allowed(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.contains(origin),
        }
    }

    /// Returns the allow-origin header value for a given origin.
    #[must_use]
    pub fn header_value(&self, origin: &str) -> Option<HeaderValue> {
        match self {
            Self::Any => Some(HeaderValue::from_static("*")),
            Self::List(origins) => {
                if origins.contains(origin) {
                    HeaderValue::from_str(origin).ok()
                } else {
                    None
                }
            }
        }
    }
}

/// Configuration for CORS middleware.
#[derive(Debug, Clone)]
struct CorsConfig {
    /// Allowed origins. An empty list means no origins allowed.
    allowed_origins: AllowedOrigins,
    /// Allowed HTTP methods.
    allowed_methods: HashSet<Method>,
    /// Allowed request headers (lowercase).
    allowed_headers: HashSet<String>,
    /// Headers exposed to JavaScript (lowercase).
    expose_headers: HashSet<String>,
    /// Whether to allow credentials (cookies, authorization headers).
    allow_credentials: bool,
    /// Max age for preflight cache.
    max_age: Option<Duration>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: AllowedOrigins::List(HashSet::new()),
            allowed_methods: HashSet::from([
                Method::GET,
                Method::HEAD,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
            ]),
            allowed_headers: HashSet::from([
                "content-type".to_string(),
                "authorization".to_string(),
                "x-request-id".to_string(),
            ]),
            expose_headers: HashSet::new(),
            allow_credentials: false,
            max_age: Some(Duration::from_secs(86400)),
        }
    }
}

/// Builder for CORS configuration.
#[derive(Debug, Clone, Default)]
pub struct CorsBuilder {
    config: CorsConfig,
}

impl CorsBuilder {
    /// Creates a new CORS builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows any origin (wildcard `*`).
    ///
    /// **Warning**: browsers reject `Access-Control-Allow-Origin: *`
    /// combined with `Access-Control-Allow-Credentials: true`.
    #[must_use]
    pub fn allow_any_origin(mut self) -> Self {
        self.config.allowed_origins = AllowedOrigins::Any;
        self
    }

    /// Adds an allowed origin.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        match &mut self.config.allowed_origins {
            AllowedOrigins::Any => {}
            AllowedOrigins::List(origins) => {
                origins.insert(origin.into());
            }
        }
        self
    }

    /// Sets the allowed HTTP methods.
    #[must_use]
    pub fn allow_methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        self.config.allowed_methods = methods.into_iter().collect();
        self
    }

    /// Sets the allowed request headers.
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_headers = headers
            .into_iter()
            .map(|h| h.into().to_lowercase())
            .collect();
        self
    }

    /// Sets headers that should be exposed to JavaScript.
    #[must_use]
    pub fn expose_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.expose_headers = headers
            .into_iter()
            .map(|h| h.into().to_lowercase())
            .collect();
        self
    }

    /// Sets whether to allow credentials.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.config.allow_credentials = allow;
        self
    }

    /// Sets the max age for preflight cache.
    #[must_use]
    pub fn max_age(mut self, duration: Duration) -> Self {
        self.config.max_age = Some(duration);
        self
    }

    /// Builds the CORS middleware.
    #[must_use]
    pub fn build(self) -> CorsMiddleware {
        CorsMiddleware {
            config: self.config,
        }
    }
}

/// CORS middleware.
///
/// Should run before all other stages so preflights are answered without
/// touching the body pipeline or the handler.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    config: CorsConfig,
}

impl CorsMiddleware {
    /// Creates a new CORS builder.
    #[must_use]
    pub fn builder() -> CorsBuilder {
        CorsBuilder::new()
    }

    /// Creates a permissive CORS middleware that allows any origin.
    ///
    /// Intended for development.
    #[must_use]
    pub fn permissive() -> Self {
        CorsBuilder::new()
            .allow_any_origin()
            .allow_methods([
                Method::GET,
                Method::HEAD,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::OPTIONS,
            ])
            .allow_headers(["*"])
            .build()
    }

    /// Checks if a request is a CORS preflight request.
    fn is_preflight(request: &Request) -> bool {
        request.method() == Method::OPTIONS
            && request.headers().contains_key(headers::ORIGIN)
            && request.headers().contains_key(headers::REQUEST_METHOD)
    }

    /// Gets the origin from a request.
    fn origin(request: &Request) -> Option<&str> {
        request
            .headers()
            .get(headers::ORIGIN)
            .and_then(|v| v.to_str().ok())
    }

    /// Handles a preflight OPTIONS request.
    fn handle_preflight(&self, request: &Request) -> Response {
        let origin = match Self::origin(request) {
            Some(o) => o,
            None => return Response::error(StatusCode::FORBIDDEN, "Missing Origin header"),
        };

        if !self.config.allowed_origins.is_allowed(origin) {
            return Response::error(StatusCode::FORBIDDEN, "Origin not allowed");
        }

        if let Some(requested) = request.headers().get(headers::REQUEST_METHOD) {
            if let Ok(method) = requested.to_str().unwrap_or("").parse::<Method>() {
                if !self.config.allowed_methods.contains(&method) {
                    return Response::error(StatusCode::FORBIDDEN, "Method not allowed");
                }
            }
        }

        if let Some(requested) = request.headers().get(headers::REQUEST_HEADERS) {
            if let Ok(headers_str) = requested.to_str() {
                if !self.config.allowed_headers.contains("*") {
                    for header in headers_str.split(',').map(|h| h.trim().to_lowercase()) {
                        if !self.config.allowed_headers.contains(&header) {
                            return Response::error(StatusCode::FORBIDDEN, "Header not allowed");
                        }
                    }
                }
            }
        }

        self.preflight_response(origin)
    }

    /// Creates a 204 No Content preflight response with CORS headers.
    fn preflight_response(&self, origin: &str) -> Response {
        let mut builder = http::Response::builder().status(StatusCode::NO_CONTENT);

        if let Some(value) = self.config.allowed_origins.header_value(origin) {
            builder = builder.header(headers::ALLOW_ORIGIN, value);
        }

        let methods = self
            .config
            .allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        builder = builder.header(headers::ALLOW_METHODS, methods);

        let allow_headers = self
            .config
            .allowed_headers
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        builder = builder.header(headers::ALLOW_HEADERS, allow_headers);

        if self.config.allow_credentials {
            builder = builder.header(headers::ALLOW_CREDENTIALS, "true");
        }

        if let Some(max_age) = self.config.max_age {
            builder = builder.header(headers::MAX_AGE, max_age.as_secs().to_string());
        }

        if matches!(self.config.allowed_origins, AllowedOrigins::List(_)) {
            builder = builder.header(headers::VARY, "Origin");
        }

        builder
            .body(http_body_util::Full::new(bytes::Bytes::new()))
            .expect("failed to build preflight response")
    }

    /// Annotates a pass-through response with CORS headers.
    fn annotate(&self, response: &mut Response, origin: &str) {
        let Some(value) = self.config.allowed_origins.header_value(origin) else {
            return;
        };

        response.headers_mut().insert(headers::ALLOW_ORIGIN, value);

        if self.config.allow_credentials {
            response
                .headers_mut()
                .insert(headers::ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }

        if !self.config.expose_headers.is_empty() {
            let exposed = self
                .config
                .expose_headers
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&exposed) {
                response.headers_mut().insert(headers::EXPOSE_HEADERS, value);
            }
        }

        if matches!(self.config.allowed_origins, AllowedOrigins::List(_)) {
            response
                .headers_mut()
                .insert(headers::VARY, HeaderValue::from_static("Origin"));
        }
    }
}

impl Middleware for CorsMiddleware {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if Self::is_preflight(&request) {
                return self.handle_preflight(&request);
            }

            let origin = Self::origin(&request).map(str::to_string);
            let mut response = next.run(ctx, request).await;

            if let Some(origin) = origin {
                self.annotate(&mut response, &origin);
            }

            response
        })
    }
}
