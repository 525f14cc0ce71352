//! State snapshot broadcast fan-out.
//!
//! [`Broadcaster`] is the [`StateSink`] the shared state is wired to.
//! Every accepted mutation hands it the full snapshot; it serializes the
//! payload once and pushes the same text frame to every registered
//! connection. A connection with a full or closed queue is skipped with a
//! log line, never awaited.

use std::sync::Arc;

use proteus_state::StateSink;
use serde_json::Value;
use tracing::{debug, warn};

use crate::message::Message;
use crate::registry::Registry;

/// Fans state snapshots out to every registered connection.
pub struct Broadcaster {
    registry: Arc<Registry>,
}

impl Broadcaster {
    /// Create a broadcaster over a registry.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// The registry this broadcaster fans out to.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Send one text frame to every member of the current registry
    /// snapshot. Failed deliveries are logged and skipped so the rest of
    /// the fan-out continues.
    pub fn broadcast(&self, payload: &str) {
        let members = self.registry.members();
        if members.is_empty() {
            return;
        }

        debug!(connections = members.len(), "broadcasting state snapshot");
        for handle in members {
            if let Err(e) = handle.try_send(Message::text(payload.to_string())) {
                warn!(connection_id = %handle.id(), error = %e, "skipping undeliverable connection");
            }
        }
    }
}

impl StateSink for Broadcaster {
    fn state_changed(&self, snapshot: &Value) {
        // Serialize once; every member receives the identical payload.
        self.broadcast(&snapshot.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionHandle, ConnectionId};
    use serde_json::json;

    #[tokio::test]
    async fn test_broadcast_reaches_all_members() {
        let registry = Arc::new(Registry::new());
        let (h1, mut rx1) = ConnectionHandle::channel(ConnectionId::new(), 8);
        let (h2, mut rx2) = ConnectionHandle::channel(ConnectionId::new(), 8);
        registry.add(h1);
        registry.add(h2);

        let broadcaster = Broadcaster::new(registry);
        broadcaster.state_changed(&json!({"count": 1}));

        assert_eq!(rx1.recv().await, Some(Message::text(r#"{"count":1}"#)));
        assert_eq!(rx2.recv().await, Some(Message::text(r#"{"count":1}"#)));
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_connection() {
        let registry = Arc::new(Registry::new());
        let (h1, rx1) = ConnectionHandle::channel(ConnectionId::new(), 8);
        let (h2, mut rx2) = ConnectionHandle::channel(ConnectionId::new(), 8);
        registry.add(h1);
        registry.add(h2);
        drop(rx1);

        let broadcaster = Broadcaster::new(registry);
        broadcaster.state_changed(&json!({"count": 2}));

        // The live connection still receives the snapshot.
        assert_eq!(rx2.recv().await, Some(Message::text(r#"{"count":2}"#)));
    }

    #[tokio::test]
    async fn test_broadcast_skips_full_queue() {
        let registry = Arc::new(Registry::new());
        let (h1, mut rx1) = ConnectionHandle::channel(ConnectionId::new(), 1);
        let (h2, mut rx2) = ConnectionHandle::channel(ConnectionId::new(), 8);
        h1.try_send(Message::text("backlog")).unwrap();
        registry.add(h1);
        registry.add(h2);

        let broadcaster = Broadcaster::new(registry);
        broadcaster.state_changed(&json!({"count": 3}));

        assert_eq!(rx1.recv().await, Some(Message::text("backlog")));
        assert_eq!(rx2.recv().await, Some(Message::text(r#"{"count":3}"#)));
    }

    #[tokio::test]
    async fn test_repeated_snapshot_sends_identical_frames_and_keeps_membership() {
        let registry = Arc::new(Registry::new());
        let (h1, mut rx1) = ConnectionHandle::channel(ConnectionId::new(), 8);
        let (h2, mut rx2) = ConnectionHandle::channel(ConnectionId::new(), 8);
        registry.add(h1);
        registry.add(h2);
        let stats_before = registry.stats();

        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        let snapshot = json!({"count": 0, "users": []});
        broadcaster.state_changed(&snapshot);
        broadcaster.state_changed(&snapshot);

        // Both deliveries carry the exact same bytes, on every connection.
        let first = rx1.recv().await.unwrap();
        let second = rx1.recv().await.unwrap();
        assert_eq!(first.as_text(), Some(r#"{"count":0,"users":[]}"#));
        assert_eq!(first, second);
        assert_eq!(rx2.recv().await.as_ref(), Some(&first));
        assert_eq!(rx2.recv().await.as_ref(), Some(&second));

        // Broadcasting never touches membership or the counters.
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.stats(), stats_before);
    }

    #[test]
    fn test_broadcast_with_no_members_is_a_noop() {
        let registry = Arc::new(Registry::new());
        let broadcaster = Broadcaster::new(registry);
        broadcaster.state_changed(&json!({"count": 4}));
    }
}
