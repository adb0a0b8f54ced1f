//! In-process message bus.
//!
//! Requests travel over a bounded `mpsc` channel; each carries a `oneshot`
//! sender for its reply.

use async_trait::async_trait;
use persistor_shared::Reply;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::{InboundMessage, MessageSource, ReplyChannel};
use crate::errors::BusError;

/// Default size of the request channel buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 1000;

/// Publisher side of the in-process bus. Cheap to clone.
#[derive(Clone)]
pub struct LocalBus {
    address: String,
    sender: mpsc::Sender<InboundMessage>,
}

/// Receiving side of the in-process bus.
pub struct LocalReceiver {
    address: String,
    receiver: mpsc::Receiver<InboundMessage>,
}

/// Reply channel backed by a `oneshot` sender.
pub struct OneshotReply {
    sender: oneshot::Sender<Reply>,
}

impl LocalBus {
    /// Create a bus serving `address` with the default buffer size.
    pub fn new(address: impl Into<String>) -> (Self, LocalReceiver) {
        Self::with_buffer_size(address, DEFAULT_BUFFER_SIZE)
    }

    /// Create a bus serving `address` with a custom buffer size.
    pub fn with_buffer_size(address: impl Into<String>, buffer_size: usize) -> (Self, LocalReceiver) {
        let address = address.into();
        let (sender, receiver) = mpsc::channel(buffer_size);

        (
            Self {
                address: address.clone(),
                sender,
            },
            LocalReceiver { address, receiver },
        )
    }

    /// The address this bus serves.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send a request and wait for its reply.
    ///
    /// # Returns
    ///
    /// * `Ok(Reply)` - The persistor's reply
    /// * `Err(BusError)` - If the receiver is gone or dropped the message unanswered
    pub async fn request(&self, body: Value) -> Result<Reply, BusError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let message = InboundMessage::new(body, Box::new(OneshotReply { sender: reply_tx }));

        self.sender
            .send(message)
            .await
            .map_err(|e| BusError::channel(e.to_string()))?;

        reply_rx
            .await
            .map_err(|e| BusError::channel(e.to_string()))
    }
}

#[async_trait]
impl MessageSource for LocalReceiver {
    async fn next(&mut self) -> Option<InboundMessage> {
        let message = self.receiver.recv().await;
        if message.is_none() {
            debug!(address = %self.address, "Local bus closed");
        }
        message
    }

    async fn close(&mut self) -> Vec<InboundMessage> {
        self.receiver.close();

        let mut pending = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            pending.push(message);
        }

        debug!(address = %self.address, pending = pending.len(), "Local bus closed");
        pending
    }
}

#[async_trait]
impl ReplyChannel for OneshotReply {
    async fn send_reply(self: Box<Self>, reply: Reply) -> Result<(), BusError> {
        self.sender
            .send(reply)
            .map_err(|_| BusError::channel("requester dropped before the reply arrived"))
    }
}
