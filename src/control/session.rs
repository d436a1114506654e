//! Per-connection lifecycle for the `/ws` control endpoint.

use super::connection::ControlConnection;
use super::registry::ConnectionRegistry;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Frames queued per connection before sends start failing.
const OUTBOUND_QUEUE: usize = 64;

/// Drive one upgraded control connection: register it, forward queued
/// frames, drain inbound traffic, and unregister on closure.
pub async fn run_ws_session(socket: WebSocket, registry: Arc<ConnectionRegistry>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (send_tx, mut send_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE);
    let connection = Arc::new(ControlConnection::new(send_tx));

    info!(conn_id = %connection.id, "control client connected");
    registry.register(connection.clone()).await;

    let outbound = tokio::spawn(async move {
        while let Some(frame) = send_rx.recv().await {
            if ws_tx.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = ws_rx.next().await {
        match message {
            Ok(Message::Close(_)) => break,
            // Commands flow server → client; other inbound frames are drained.
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %connection.id, error = %e, "control connection error");
                break;
            }
        }
    }

    connection.mark_closed();
    registry.unregister(&connection.id).await;
    outbound.abort();
    info!(conn_id = %connection.id, "control client disconnected");
}
