//! Connection registration table.
//!
//! Maps a tier-local connection id to the external client id minted by
//! the websocket gateway. Both tiers own one instance; every access goes
//! through the lock so concurrent connection tasks never race on the map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Tier-local identifier for one accepted connection.
pub type ConnectionId = u64;

/// Thread-safe connection-to-client-id table.
pub struct Registry {
    entries: RwLock<HashMap<ConnectionId, String>>,
    next_id: AtomicU64,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Mint the id for a newly accepted connection.
    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Bind a connection to an external client id.
    ///
    /// Replaces any previous binding for the connection, and evicts any
    /// other connection's binding of the same external id — one live
    /// entry per external id at a time.
    pub fn bind(&self, conn: ConnectionId, external_id: &str) {
        let mut entries = self.entries.write().unwrap();
        entries.retain(|&other, bound| {
            let stale = other != conn && bound.as_str() == external_id;
            if stale {
                debug!(conn = other, client = %external_id, "Evicting stale binding");
            }
            !stale
        });
        if let Some(previous) = entries.insert(conn, external_id.to_string()) {
            if previous != external_id {
                debug!(conn, previous = %previous, new = %external_id, "Rebound connection");
            }
        }
    }

    /// External id bound to a connection, if any.
    pub fn lookup(&self, conn: ConnectionId) -> Option<String> {
        self.entries.read().unwrap().get(&conn).cloned()
    }

    /// Drop the binding for a connection. Returns the external id that
    /// was bound, if any.
    pub fn remove(&self, conn: ConnectionId) -> Option<String> {
        self.entries.write().unwrap().remove(&conn)
    }

    /// Number of live bindings.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_lookup() {
        let registry = Registry::new();
        let conn = registry.next_connection_id();
        registry.bind(conn, "abc");
        assert_eq!(registry.lookup(conn).as_deref(), Some("abc"));
    }

    #[test]
    fn test_rebind_replaces() {
        let registry = Registry::new();
        let conn = registry.next_connection_id();
        registry.bind(conn, "abc");
        registry.bind(conn, "xyz");
        assert_eq!(registry.lookup(conn).as_deref(), Some("xyz"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_external_id_replaces_across_connections() {
        let registry = Registry::new();
        let first = registry.next_connection_id();
        let second = registry.next_connection_id();
        registry.bind(first, "abc");
        registry.bind(second, "abc");
        assert!(registry.lookup(first).is_none());
        assert_eq!(registry.lookup(second).as_deref(), Some("abc"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_clears_binding() {
        let registry = Registry::new();
        let conn = registry.next_connection_id();
        registry.bind(conn, "abc");
        assert_eq!(registry.remove(conn).as_deref(), Some("abc"));
        assert!(registry.lookup(conn).is_none());
        assert!(registry.remove(conn).is_none());
    }

    #[test]
    fn test_connection_ids_are_unique() {
        let registry = Registry::new();
        let first = registry.next_connection_id();
        let second = registry.next_connection_id();
        assert_ne!(first, second);
    }
}
