//! Message bus module for the persistor.
//!
//! Provides the seams between the serve loop and whatever carries messages:
//! a source of inbound messages and a one-shot reply channel per message.

mod kafka_bus;
mod local;
mod messages;

pub use kafka_bus::{
    KafkaBus, KafkaConfig, KafkaReply, DEFAULT_KAFKA_BROKER, DEFAULT_KAFKA_GROUP_ID,
};
pub use local::{LocalBus, LocalReceiver, OneshotReply};
pub use messages::{InboundMessage, CORRELATION_ID_HEADER, REPLY_TO_HEADER};

use async_trait::async_trait;
use persistor_shared::Reply;

use crate::errors::BusError;

/// Carries the reply for one inbound message back to its requester.
///
/// `send_reply` consumes the channel, so a message can be answered at most once.
#[async_trait]
pub trait ReplyChannel: Send {
    /// Deliver the reply.
    async fn send_reply(self: Box<Self>, reply: Reply) -> Result<(), BusError>;
}

/// Yields inbound messages addressed to the persistor.
#[async_trait]
pub trait MessageSource: Send {
    /// Wait for the next message.
    ///
    /// Returns `None` once the source is closed and no more messages will arrive.
    async fn next(&mut self) -> Option<InboundMessage>;

    /// Stop accepting messages and return those already accepted but not yet
    /// yielded by `next`. Each of them is still owed a reply.
    async fn close(&mut self) -> Vec<InboundMessage> {
        Vec::new()
    }
}
