//! Adapter implementations for realtime ports.

pub mod channel;

pub use channel::{ChannelSink, SocketFrame};
