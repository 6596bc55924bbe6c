//! Connection sink backed by a tokio channel.
//!
//! The socket writer task owns the receiving half and forwards frames to the
//! wire; the hub only ever touches the sending half.

use crate::realtime::ports::{ConnectionSink, DeliveryError};
use tokio::sync::mpsc;
use tracing::debug;

/// Frame handed to a socket writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketFrame {
    /// Serialized JSON message.
    Text(String),
    /// Request to close the socket.
    Close,
}

/// [`ConnectionSink`] writing into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<SocketFrame>,
}

impl ChannelSink {
    /// Creates a sink and the receiver its frames arrive on.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SocketFrame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ConnectionSink for ChannelSink {
    fn send(&self, frame: &str) -> Result<(), DeliveryError> {
        self.sender
            .send(SocketFrame::Text(frame.to_owned()))
            .map_err(|_| DeliveryError::Closed)
    }

    fn close(&self) {
        if self.sender.send(SocketFrame::Close).is_err() {
            debug!("socket writer already gone");
        }
    }
}
