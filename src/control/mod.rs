//! Server side of the control channel: connection tracking, command
//! fan-out, and per-connection session lifecycle.

pub mod broadcast;
pub mod connection;
pub mod registry;
pub mod session;

pub use broadcast::CommandBroadcaster;
pub use connection::ControlConnection;
pub use registry::ConnectionRegistry;
pub use session::run_ws_session;
