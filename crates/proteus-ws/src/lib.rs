//! # Proteus WebSocket
//!
//! The streaming side of a Proteus server: RFC 6455 upgrade handling, a
//! registry of live connections with bounded per-connection send queues,
//! and the broadcaster that fans every state snapshot out to all of them.
//!
//! The pieces compose around [`proteus_state::SharedState`]:
//!
//! - [`upgrade`] validates the handshake and builds the `101` response
//! - [`run_sync_session`] drives one upgraded connection, applying inbound
//!   [`SyncMessage`] frames to the state
//! - [`Broadcaster`] implements [`proteus_state::StateSink`], so every
//!   accepted mutation reaches every registered connection as one
//!   identical text frame

#![forbid(unsafe_code)]

pub mod broadcast;
pub mod connection;
pub mod error;
pub mod message;
pub mod registry;
pub mod sync;
pub mod upgrade;

pub use broadcast::Broadcaster;
pub use connection::{ConnectionHandle, ConnectionId, DEFAULT_SEND_QUEUE};
pub use error::{CloseCode, WsError, WsResult};
pub use message::{CloseFrame, Message};
pub use registry::{Registry, RegistryStats};
pub use sync::{run_sync_session, FrameHook, SyncMessage};
pub use upgrade::{
    complete_upgrade, is_websocket_request, prepare_upgrade, validate_upgrade_request,
    WebSocketUpgrade,
};
