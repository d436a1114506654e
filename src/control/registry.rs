//! Tracks currently open control connections.

use super::connection::ControlConnection;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// The set of currently open peer connections.
///
/// A connection is a member exactly while it is open: its session task
/// registers it once after the handshake and unregisters it once on
/// closure, so the registry never holds stale entries for long. A peer may
/// still close between registration and iteration, which is why
/// `open_connections` re-checks the open flag.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<Uuid, Arc<ControlConnection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection after a successful handshake.
    pub async fn register(&self, connection: Arc<ControlConnection>) {
        let mut connections = self.connections.write().await;
        let _ = connections.insert(connection.id, connection);
    }

    /// Remove a connection on closure. Idempotent.
    pub async fn unregister(&self, id: &Uuid) {
        let mut connections = self.connections.write().await;
        let _ = connections.remove(id);
    }

    /// Connections still open at the time of the call.
    pub async fn open_connections(&self) -> Vec<Arc<ControlConnection>> {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|c| c.is_open())
            .cloned()
            .collect()
    }

    /// Number of registered connections.
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn make_connection() -> (Arc<ControlConnection>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(8);
        (Arc::new(ControlConnection::new(tx)), rx)
    }

    #[tokio::test]
    async fn register_and_unregister() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = make_connection();
        let id = conn.id;

        registry.register(conn).await;
        assert_eq!(registry.count().await, 1);

        registry.unregister(&id).await;
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn unregister_twice_is_a_noop() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = make_connection();
        let id = conn.id;

        registry.register(conn).await;
        registry.unregister(&id).await;
        registry.unregister(&id).await;
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn unregister_unknown_id_is_a_noop() {
        let registry = ConnectionRegistry::new();
        registry.unregister(&Uuid::new_v4()).await;
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn open_connections_skips_closed_peers() {
        let registry = ConnectionRegistry::new();
        let (open_conn, _rx1) = make_connection();
        let (closed_conn, _rx2) = make_connection();
        let open_id = open_conn.id;

        registry.register(open_conn).await;
        registry.register(closed_conn.clone()).await;

        // Closes after registration but before iteration.
        closed_conn.mark_closed();

        let open = registry.open_connections().await;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, open_id);
    }
}
