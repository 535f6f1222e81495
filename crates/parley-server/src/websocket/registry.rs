//! The connection registry: identity → live connection.
//!
//! Single source of truth for who is online. At most one entry exists per
//! identity at any observable instant; registering over an existing entry
//! returns the superseded connection so the router can close it (the registry
//! itself never closes anything — closing before the replacement finishes
//! registering would race).
//!
//! Iteration hands out a copied point-in-time view, so callers never observe
//! a mutation mid-walk.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use parley_core::Username;

use super::connection::ClientConnection;

/// Live connections indexed by identity.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<Username, Arc<ClientConnection>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for the connection's identity.
    ///
    /// Returns the superseded connection if one was present; closing it is
    /// the caller's responsibility.
    pub async fn register(&self, connection: Arc<ClientConnection>) -> Option<Arc<ClientConnection>> {
        let mut conns = self.connections.write().await;
        conns.insert(connection.username.clone(), connection)
    }

    /// Remove the entry for `username` if present; no-op otherwise.
    pub async fn unregister(&self, username: &Username) -> Option<Arc<ClientConnection>> {
        let mut conns = self.connections.write().await;
        conns.remove(username)
    }

    /// Remove the entry for this exact connection.
    ///
    /// Returns `false` if the identity is absent or registered to a
    /// different (newer) connection, so a superseded session tearing itself
    /// down cannot evict its replacement.
    pub async fn unregister_exact(&self, connection: &Arc<ClientConnection>) -> bool {
        let mut conns = self.connections.write().await;
        match conns.get(&connection.username) {
            Some(current) if Arc::ptr_eq(current, connection) => {
                let _ = conns.remove(&connection.username);
                true
            }
            _ => false,
        }
    }

    /// Look up the live connection for `username`.
    pub async fn lookup(&self, username: &Username) -> Option<Arc<ClientConnection>> {
        self.connections.read().await.get(username).cloned()
    }

    /// Sorted snapshot of connected identities, for display.
    pub async fn snapshot(&self) -> Vec<Username> {
        let conns = self.connections.read().await;
        let mut users: Vec<Username> = conns.keys().cloned().collect();
        users.sort();
        users
    }

    /// Copied point-in-time view of all connections.
    pub async fn connections(&self) -> Vec<Arc<ClientConnection>> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Number of active connections.
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use super::super::connection::OutboundFrame;

    fn make_connection(name: &str) -> (Arc<ClientConnection>, mpsc::Receiver<OutboundFrame>) {
        let (tx, rx) = mpsc::channel(8);
        let conn = Arc::new(ClientConnection::new(
            Username::parse(name).unwrap(),
            tx,
        ));
        (conn, rx)
    }

    fn user(name: &str) -> Username {
        Username::parse(name).unwrap()
    }

    #[tokio::test]
    async fn register_and_lookup() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = make_connection("alice");
        assert!(registry.register(conn.clone()).await.is_none());
        let found = registry.lookup(&user("alice")).await.unwrap();
        assert!(Arc::ptr_eq(&found, &conn));
    }

    #[tokio::test]
    async fn roster_tracks_registrations() {
        let registry = ConnectionRegistry::new();
        let (a, _ra) = make_connection("alice");
        let (b, _rb) = make_connection("bob");
        let (c, _rc) = make_connection("carol");
        let _ = registry.register(a).await;
        let _ = registry.register(b).await;
        let _ = registry.register(c).await;
        assert_eq!(registry.count().await, 3);

        let _ = registry.unregister(&user("bob")).await;
        assert_eq!(registry.count().await, 2);
        let roster = registry.snapshot().await;
        assert_eq!(roster, vec![user("alice"), user("carol")]);
        assert!(!roster.contains(&user("bob")));
    }

    #[tokio::test]
    async fn snapshot_is_sorted() {
        let registry = ConnectionRegistry::new();
        for name in ["zoe", "amy", "mia"] {
            let (conn, _rx) = make_connection(name);
            let _ = registry.register(conn).await;
        }
        let roster = registry.snapshot().await;
        assert_eq!(roster, vec![user("amy"), user("mia"), user("zoe")]);
    }

    #[tokio::test]
    async fn reconnect_supersedes_previous_entry() {
        let registry = ConnectionRegistry::new();
        let (first, _r1) = make_connection("alice");
        let (second, _r2) = make_connection("alice");

        assert!(registry.register(first.clone()).await.is_none());
        let superseded = registry.register(second.clone()).await.unwrap();
        assert!(Arc::ptr_eq(&superseded, &first));

        // Exactly one entry for the identity, and it is the newer one.
        assert_eq!(registry.count().await, 1);
        let current = registry.lookup(&user("alice")).await.unwrap();
        assert!(Arc::ptr_eq(&current, &second));
    }

    #[tokio::test]
    async fn unregister_absent_identity_is_a_noop() {
        let registry = ConnectionRegistry::new();
        assert!(registry.unregister(&user("ghost")).await.is_none());
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn stale_connection_cannot_unregister_its_replacement() {
        let registry = ConnectionRegistry::new();
        let (old, _r1) = make_connection("alice");
        let (new, _r2) = make_connection("alice");
        let _ = registry.register(old.clone()).await;
        let _ = registry.register(new.clone()).await;

        // The superseded session's cleanup must leave the new entry alone.
        assert!(!registry.unregister_exact(&old).await);
        assert_eq!(registry.count().await, 1);

        assert!(registry.unregister_exact(&new).await);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn connections_view_is_a_copy() {
        let registry = ConnectionRegistry::new();
        let (a, _ra) = make_connection("alice");
        let _ = registry.register(a).await;

        let view = registry.connections().await;
        let (b, _rb) = make_connection("bob");
        let _ = registry.register(b).await;

        // The earlier view does not observe the later mutation.
        assert_eq!(view.len(), 1);
        assert_eq!(registry.count().await, 2);
    }
}
