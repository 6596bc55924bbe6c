//! Outbound half of a client connection.

use std::sync::Arc;
use thiserror::Error;

/// Pushes frames to one live client socket.
///
/// Implementations must not block: the hub calls them from its single
/// processing loop.
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionSink: Send + Sync {
    /// Queues a text frame for the client.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the socket is closing or the transport
    /// fails.
    fn send(&self, frame: &str) -> Result<(), DeliveryError>;

    /// Asks the transport to close the socket.
    fn close(&self);
}

/// Failure to hand a frame to a socket.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// The socket is already closed or closing.
    #[error("connection closed")]
    Closed,

    /// Transport failure.
    #[error("transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl DeliveryError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
