//! The connection registry.
//!
//! Tracks every live streaming connection's [`ConnectionHandle`]. The
//! broadcaster snapshots the membership before fanning out, so a
//! connection added mid-broadcast joins from the next change.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use tracing::debug;

use crate::connection::{ConnectionHandle, ConnectionId};

/// Statistics about the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of currently registered connections.
    pub active_connections: usize,
    /// Total connections ever registered.
    pub total_accepted: usize,
    /// Total connections removed.
    pub total_closed: usize,
}

/// A registry of live connection handles.
///
/// # Example
///
/// ```
/// use proteus_ws::{ConnectionHandle, ConnectionId, Registry};
///
/// let registry = Registry::new();
/// let id = ConnectionId::new();
/// let (handle, _rx) = ConnectionHandle::channel(id, 8);
///
/// registry.add(handle);
/// assert!(registry.contains(&id));
///
/// registry.remove(&id);
/// assert!(registry.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    connections: DashMap<ConnectionId, ConnectionHandle>,
    total_accepted: AtomicUsize,
    total_closed: AtomicUsize,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection handle.
    ///
    /// Re-adding an already registered ID replaces the handle and is not
    /// counted as a new acceptance.
    pub fn add(&self, handle: ConnectionHandle) {
        let id = handle.id();
        if self.connections.insert(id, handle).is_none() {
            self.total_accepted.fetch_add(1, Ordering::Relaxed);
            debug!(connection_id = %id, total = self.connections.len(), "connection registered");
        }
    }

    /// Remove a connection. Idempotent.
    pub fn remove(&self, id: &ConnectionId) -> Option<ConnectionHandle> {
        let removed = self.connections.remove(id).map(|(_, handle)| handle);
        if removed.is_some() {
            self.total_closed.fetch_add(1, Ordering::Relaxed);
            debug!(connection_id = %id, "connection removed");
        }
        removed
    }

    /// Check if a connection is registered.
    #[must_use]
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    /// Number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns true if no connections are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Snapshot of the current membership.
    #[must_use]
    pub fn members(&self) -> Vec<ConnectionHandle> {
        self.connections.iter().map(|e| e.value().clone()).collect()
    }

    /// Statistics about the registry.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            active_connections: self.connections.len(),
            total_accepted: self.total_accepted.load(Ordering::Relaxed),
            total_closed: self.total_closed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::DEFAULT_SEND_QUEUE;

    fn handle() -> (ConnectionId, ConnectionHandle, tokio::sync::mpsc::Receiver<crate::Message>) {
        let id = ConnectionId::new();
        let (handle, rx) = ConnectionHandle::channel(id, DEFAULT_SEND_QUEUE);
        (id, handle, rx)
    }

    #[test]
    fn test_add_and_remove() {
        let registry = Registry::new();
        let (id, h, _rx) = handle();

        registry.add(h);
        assert!(registry.contains(&id));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(&id).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = Registry::new();
        let (id, h, _rx) = handle();

        registry.add(h);
        assert!(registry.remove(&id).is_some());
        assert!(registry.remove(&id).is_none());
        assert_eq!(registry.stats().total_closed, 1);
    }

    #[test]
    fn test_readd_replaces_without_double_count() {
        let registry = Registry::new();
        let (id, h, _rx) = handle();
        let (h2, _rx2) = ConnectionHandle::channel(id, DEFAULT_SEND_QUEUE);

        registry.add(h);
        registry.add(h2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.stats().total_accepted, 1);
    }

    #[test]
    fn test_members_snapshot() {
        let registry = Registry::new();
        let (_, h1, _rx1) = handle();
        let (_, h2, _rx2) = handle();

        registry.add(h1);
        registry.add(h2);

        let members = registry.members();
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn test_stats_track_lifecycle() {
        let registry = Registry::new();
        let (id, h, _rx) = handle();

        registry.add(h);
        registry.remove(&id);

        let stats = registry.stats();
        assert_eq!(stats.active_connections, 0);
        assert_eq!(stats.total_accepted, 1);
        assert_eq!(stats.total_closed, 1);
    }
}
