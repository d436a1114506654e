//! Client side of the control channel.
//!
//! One [`ControlChannel`] per process owns the single shared connection;
//! any number of logical consumers attach start/stop callbacks to it
//! without ever owning the connection themselves.

pub mod channel;

pub use channel::{
    ChannelConfig, ChannelState, CommandHandler, ConsumerId, ControlChannel, RECONNECT_DELAY,
};
