use log::trace;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::notifications::PushMessage;

#[derive(Debug, Clone, Error)]
pub enum PushError {
    #[error("Push transport is closed")]
    Closed,
    #[error("Push transport error: {0}")]
    Other(String),
}

/// The delivery mechanism behind the fan-out. Publishing is best effort and must not block.
pub trait PushTransport: Send + Sync {
    fn publish(&self, message: PushMessage) -> Result<(), PushError>;
}

/// An in-process transport. Every subscriber stream receives every message and keeps the ones addressed to it.
#[derive(Debug, Clone)]
pub struct BroadcastPushTransport {
    sender: broadcast::Sender<PushMessage>,
}

impl BroadcastPushTransport {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushMessage> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastPushTransport {
    fn default() -> Self {
        Self::new(256)
    }
}

impl PushTransport for BroadcastPushTransport {
    fn publish(&self, message: PushMessage) -> Result<(), PushError> {
        match self.sender.send(message) {
            Ok(n) => trace!("📬️ Push message sent to {n} open streams"),
            // Nobody is listening. That's fine; they'll catch up when they poll.
            Err(_) => trace!("📬️ No open push streams. Message dropped."),
        }
        Ok(())
    }
}
