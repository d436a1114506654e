//! HTTP API + control channel surface
//!
//! This module provides the request surface for coordinating a
//! transcription session:
//! - GET  /ws                - control channel upgrade
//! - POST /api/transcription - store a result, resolve a waiting stop
//! - GET  /api/transcription - list stored results
//! - POST /api/toggle        - flip the active flag, broadcast start/stop
//! - POST /api/start         - broadcast start
//! - POST /api/stop          - broadcast stop, wait for the next result
//! - GET  /health            - health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
