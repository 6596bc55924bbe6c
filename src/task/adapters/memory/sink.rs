//! Mutation sink that records notices on a channel.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::task::ports::{MutationNotice, MutationSink, SinkError};

/// Forwards every notice to an unbounded channel, for activity logs kept in
/// memory and for tests that await delivery.
#[derive(Debug, Clone)]
pub struct RecordingMutationSink {
    sender: mpsc::UnboundedSender<MutationNotice>,
}

impl RecordingMutationSink {
    /// Creates a sink and the receiver its notices arrive on.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<MutationNotice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl MutationSink for RecordingMutationSink {
    async fn notify(&self, notice: &MutationNotice) -> Result<(), SinkError> {
        self.sender
            .send(notice.clone())
            .map_err(|err| SinkError::new(std::io::Error::other(err.to_string())))
    }
}
