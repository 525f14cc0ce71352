//! Connection identity and the per-connection send queue.
//!
//! Each live connection owns a bounded outbound queue. The broadcaster
//! pushes snapshots through [`ConnectionHandle::try_send`] without ever
//! blocking; the connection's writer task drains the queue onto the wire.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{WsError, WsResult};
use crate::message::Message;

/// Default capacity of a connection's outbound queue.
pub const DEFAULT_SEND_QUEUE: usize = 64;

/// A unique identifier for a WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Create a new random connection ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Sending half of a connection's outbound queue.
///
/// Cloneable; the writer task holds the receiving half and ends when every
/// handle has been dropped.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::Sender<Message>,
}

impl ConnectionHandle {
    /// Create a handle and its paired queue receiver.
    #[must_use]
    pub fn channel(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { id, tx }, rx)
    }

    /// The connection this handle sends to.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a message without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::SendQueueFull`] if the queue is at capacity, or
    /// [`WsError::ConnectionClosed`] if the writer task has ended.
    pub fn try_send(&self, message: Message) -> WsResult<()> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => WsError::send_queue_full(self.id),
            mpsc::error::TrySendError::Closed(_) => {
                WsError::connection_closed(None, "send queue receiver dropped")
            }
        })
    }

    /// Returns true if the writer task has dropped the queue receiver.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
