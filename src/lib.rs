pub mod client;
pub mod config;
pub mod control;
pub mod correlate;
pub mod http;
pub mod protocol;
pub mod store;

pub use client::{ChannelConfig, ChannelState, ControlChannel};
pub use config::Config;
pub use control::{CommandBroadcaster, ConnectionRegistry, ControlConnection};
pub use correlate::{CorrelateError, EventCorrelator};
pub use http::{create_router, AppState};
pub use protocol::Command;
pub use store::{TranscriptionLog, TranscriptionRecord};
