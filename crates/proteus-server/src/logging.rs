//! Logging initialization.
//!
//! `RUST_LOG` wins when set; otherwise the verbose flag picks the
//! default level. Initialization is idempotent so tests and embedded
//! servers can call it freely.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (tests, multiple servers in-process) is a no-op.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .ok();
}
