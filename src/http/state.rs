use crate::control::{CommandBroadcaster, ConnectionRegistry};
use crate::correlate::EventCorrelator;
use crate::store::TranscriptionLog;
use std::sync::Arc;
use std::time::Duration;

/// How long `/api/stop` waits for the next record before giving up.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Open control connections
    pub registry: Arc<ConnectionRegistry>,

    /// Command fan-out over the registry
    pub broadcaster: Arc<CommandBroadcaster>,

    /// Pending stop-request correlation
    pub correlator: Arc<EventCorrelator>,

    /// Stored transcriptions plus the active flag
    pub log: Arc<TranscriptionLog>,

    /// Wait budget for `/api/stop`
    pub stop_timeout: Duration,
}

impl AppState {
    pub fn new(stop_timeout: Duration) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        Self {
            broadcaster: Arc::new(CommandBroadcaster::new(registry.clone())),
            registry,
            correlator: Arc::new(EventCorrelator::new()),
            log: Arc::new(TranscriptionLog::new()),
            stop_timeout,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_TIMEOUT)
    }
}
