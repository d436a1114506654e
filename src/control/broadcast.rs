//! Command fan-out to every open control connection.

use super::registry::ConnectionRegistry;
use crate::protocol::{self, Command};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct CommandBroadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl CommandBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Encode `command` once and send the identical frame to every open
    /// connection.
    ///
    /// A connection that refuses the frame (closing, queue full) is skipped
    /// without aborting the rest of the broadcast. Returns the number of
    /// recipients.
    pub async fn broadcast(&self, command: Command) -> usize {
        let frame = protocol::encode(command);
        let mut recipients = 0;

        for connection in self.registry.open_connections().await {
            if connection.send(frame.clone()) {
                recipients += 1;
            } else {
                warn!(conn_id = %connection.id, command = %command, "skipped unreachable connection");
            }
        }

        debug!(command = %command, recipients, "broadcast control command");
        recipients
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::connection::ControlConnection;
    use tokio::sync::mpsc;

    fn make_connection() -> (Arc<ControlConnection>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(8);
        (Arc::new(ControlConnection::new(tx)), rx)
    }

    #[tokio::test]
    async fn broadcast_reaches_every_open_connection() {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = CommandBroadcaster::new(registry.clone());

        let (c1, mut rx1) = make_connection();
        let (c2, mut rx2) = make_connection();
        registry.register(c1).await;
        registry.register(c2).await;

        let sent = broadcaster.broadcast(Command::Start).await;
        assert_eq!(sent, 2);

        let f1 = rx1.try_recv().unwrap();
        let f2 = rx2.try_recv().unwrap();
        // Identical bytes for every recipient.
        assert_eq!(f1, f2);
        assert_eq!(f1, r#"{"command":"transcribe-start"}"#);
    }

    #[tokio::test]
    async fn broadcast_skips_closed_connection_without_aborting() {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = CommandBroadcaster::new(registry.clone());

        let (alive, mut alive_rx) = make_connection();
        let (closing, mut closing_rx) = make_connection();
        registry.register(alive).await;
        registry.register(closing.clone()).await;

        closing.mark_closed();

        let sent = broadcaster.broadcast(Command::Stop).await;
        assert_eq!(sent, 1);
        assert!(alive_rx.try_recv().is_ok());
        assert!(closing_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_to_empty_registry_sends_nothing() {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = CommandBroadcaster::new(registry);
        assert_eq!(broadcaster.broadcast(Command::Start).await, 0);
    }

    #[tokio::test]
    async fn send_failure_does_not_stop_the_rest() {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = CommandBroadcaster::new(registry.clone());

        // Dropped receiver: the send itself fails mid-broadcast.
        let (dead_tx, dead_rx) = mpsc::channel(8);
        drop(dead_rx);
        registry
            .register(Arc::new(ControlConnection::new(dead_tx)))
            .await;

        let (alive, mut alive_rx) = make_connection();
        registry.register(alive).await;

        let sent = broadcaster.broadcast(Command::Stop).await;
        assert_eq!(sent, 1);
        assert_eq!(
            alive_rx.try_recv().unwrap(),
            r#"{"command":"transcribe-stop"}"#
        );
    }
}
