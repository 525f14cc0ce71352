//! Server configuration types.
//!
//! Two builder-style records: [`ServerConfig`] fixes the request-handling
//! behavior of a server (CORS policy, body handling, which paths upgrade
//! to WebSocket), while [`StartConfig`] carries per-launch settings
//! (bind address, logging verbosity, raw-frame hook).
//!
//! # Example
//!
//! ```rust
//! use proteus_server::{ServerConfig, StartConfig};
//!
//! let config = ServerConfig::builder()
//!     .max_body_size(1024 * 1024)
//!     .upgrade_path("/sync")
//!     .build();
//!
//! let start = StartConfig::new().host("127.0.0.1").port(8080);
//! assert_eq!(start.addr(), "127.0.0.1:8080");
//! ```

use std::sync::Arc;
use std::time::Duration;

use proteus_middleware::stages::cors::CorsMiddleware;
use proteus_middleware::stages::body_limit::DEFAULT_MAX_BODY_SIZE;
use proteus_ws::FrameHook;

/// Default host to bind to.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port to bind to.
pub const DEFAULT_PORT: u16 = 3000;

/// Default path that accepts WebSocket upgrades.
pub const DEFAULT_UPGRADE_PATH: &str = "/sync";

/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Fixed behavior of a server instance.
///
/// Use [`ServerConfig::builder()`] to construct instances.
#[derive(Clone)]
pub struct ServerConfig {
    cors: Option<Arc<CorsMiddleware>>,
    enable_body_parser: bool,
    max_body_size: usize,
    upgrade_paths: Vec<String>,
    shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    /// Returns the CORS stage, if configured.
    #[must_use]
    pub fn cors(&self) -> Option<&Arc<CorsMiddleware>> {
        self.cors.as_ref()
    }

    /// Returns whether the global body parser stage is enabled.
    #[must_use]
    pub fn enable_body_parser(&self) -> bool {
        self.enable_body_parser
    }

    /// Returns the maximum accepted request body size in bytes.
    #[must_use]
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Returns the paths that accept WebSocket upgrades.
    #[must_use]
    pub fn upgrade_paths(&self) -> &[String] {
        &self.upgrade_paths
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
pub struct ServerConfigBuilder {
    cors: Option<Arc<CorsMiddleware>>,
    enable_body_parser: bool,
    max_body_size: usize,
    upgrade_paths: Vec<String>,
    shutdown_timeout: Duration,
}

impl ServerConfigBuilder {
    /// Creates a builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cors: None,
            enable_body_parser: true,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            upgrade_paths: vec![DEFAULT_UPGRADE_PATH.to_string()],
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }

    /// Installs a CORS stage at the front of the pipeline.
    #[must_use]
    pub fn cors(mut self, cors: CorsMiddleware) -> Self {
        self.cors = Some(Arc::new(cors));
        self
    }

    /// Enables or disables the global body parser stage.
    #[must_use]
    pub fn enable_body_parser(mut self, enabled: bool) -> Self {
        self.enable_body_parser = enabled;
        self
    }

    /// Sets the maximum accepted request body size in bytes.
    #[must_use]
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Replaces the set of upgrade paths.
    #[must_use]
    pub fn upgrade_paths(mut self, paths: Vec<String>) -> Self {
        self.upgrade_paths = paths;
        self
    }

    /// Adds one upgrade path.
    #[must_use]
    pub fn upgrade_path(mut self, path: impl Into<String>) -> Self {
        self.upgrade_paths.push(path.into());
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            cors: self.cors,
            enable_body_parser: self.enable_body_parser,
            max_body_size: self.max_body_size,
            upgrade_paths: self.upgrade_paths,
            shutdown_timeout: self.shutdown_timeout,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-launch settings passed to [`crate::Server::run`].
#[derive(Clone, Default)]
pub struct StartConfig {
    host: Option<String>,
    port: Option<u16>,
    verbose_logging: bool,
    on_frame: Option<FrameHook>,
}

impl StartConfig {
    /// Creates a start configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host to bind to.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the port to bind to.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Enables debug-level logging.
    #[must_use]
    pub fn verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    /// Installs a hook invoked with every raw inbound WebSocket frame.
    #[must_use]
    pub fn on_frame(mut self, hook: FrameHook) -> Self {
        self.on_frame = Some(hook);
        self
    }

    /// The bind address as `host:port`.
    #[must_use]
    pub fn addr(&self) -> String {
        format!(
            "{}:{}",
            self.host.as_deref().unwrap_or(DEFAULT_HOST),
            self.port.unwrap_or(DEFAULT_PORT)
        )
    }

    /// Returns whether verbose logging was requested.
    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbose_logging
    }

    /// Takes the raw-frame hook, if one was installed.
    #[must_use]
    pub fn frame_hook(&self) -> Option<FrameHook> {
        self.on_frame.clone()
    }
}
