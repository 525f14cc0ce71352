//! # Proteus State
//!
//! Shared server state with generated per-field dispatchers.
//!
//! A [`StateSchema`] declares named fields, each with a fixed [`FieldKind`]
//! and an initial JSON value. [`SharedState`] is the single owner of the
//! live state: every mutation goes through a generated dispatcher (or
//! [`SharedState::assign`] for the inbound wire protocol), and every
//! accepted mutation runs as one atomic unit under the store lock:
//!
//! 1. mutate the field in place
//! 2. invoke that key's observers in registration order
//! 3. serialize a full snapshot and hand it to the [`StateSink`]
//!
//! The sink is the seam the WebSocket layer plugs its broadcaster into; it
//! is called while the lock is held, so implementations must not block.
//!
//! ## Example
//!
//! ```
//! use proteus_state::{FieldKind, SharedState, StateSchema};
//!
//! let schema = StateSchema::new()
//!     .field("count", FieldKind::Numeric, serde_json::json!(0))
//!     .field("users", FieldKind::Collection, serde_json::json!([]));
//!
//! let state = SharedState::new(schema);
//! state.dispatcher("count").unwrap().as_numeric().unwrap().increment();
//!
//! assert_eq!(state.get("count"), Some(serde_json::json!(1)));
//! ```

#![forbid(unsafe_code)]

pub mod dispatch;
pub mod error;
pub mod schema;
pub mod store;

pub use dispatch::{CollectionOps, Dispatcher, NumericOps, ObjectOps, ScalarOps};
pub use error::StateError;
pub use schema::{FieldKind, StateSchema};
pub use store::{SharedState, StateSink};
