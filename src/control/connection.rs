//! Server-side handle for one control channel peer.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use uuid::Uuid;

/// One connected control peer.
///
/// Owned by the session task that created it; everyone else holds an `Arc`
/// and interacts through `send`.
pub struct ControlConnection {
    /// Unique connection identity.
    pub id: Uuid,
    /// Outbound queue consumed by the connection's write task.
    tx: mpsc::Sender<String>,
    /// Cleared when the peer closes; checked before every send.
    open: AtomicBool,
}

impl ControlConnection {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
            open: AtomicBool::new(true),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Mark the connection closed. Safe to call more than once.
    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Queue a frame for the write task.
    ///
    /// Returns `false` when the connection is closed or its outbound queue
    /// no longer accepts frames.
    pub fn send(&self, frame: String) -> bool {
        if !self.is_open() {
            return false;
        }
        self.tx.try_send(frame).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection() -> (ControlConnection, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(8);
        (ControlConnection::new(tx), rx)
    }

    #[tokio::test]
    async fn send_queues_frame() {
        let (conn, mut rx) = make_connection();
        assert!(conn.send("frame".into()));
        assert_eq!(rx.recv().await.unwrap(), "frame");
    }

    #[test]
    fn send_after_mark_closed_fails() {
        let (conn, _rx) = make_connection();
        conn.mark_closed();
        assert!(!conn.is_open());
        assert!(!conn.send("frame".into()));
    }

    #[test]
    fn mark_closed_is_idempotent() {
        let (conn, _rx) = make_connection();
        conn.mark_closed();
        conn.mark_closed();
        assert!(!conn.is_open());
    }

    #[test]
    fn send_to_dropped_receiver_fails() {
        let (tx, rx) = mpsc::channel(8);
        let conn = ControlConnection::new(tx);
        drop(rx);
        assert!(!conn.send("frame".into()));
    }

    #[test]
    fn connections_get_distinct_ids() {
        let (a, _rxa) = make_connection();
        let (b, _rxb) = make_connection();
        assert_ne!(a.id, b.id);
    }
}
