//! Message types for the bus.

use serde_json::Value;

use super::ReplyChannel;

/// Header naming the topic a reply should be produced to.
pub const REPLY_TO_HEADER: &str = "reply_to";

/// Header echoed from a request onto its reply.
pub const CORRELATION_ID_HEADER: &str = "correlation_id";

/// A request received from the bus, paired with the channel its reply goes to.
pub struct InboundMessage {
    /// The request body. `Value::Null` when the payload was not JSON.
    pub body: Value,
    /// Where the single reply for this message is sent.
    pub reply_to: Box<dyn ReplyChannel>,
}

impl InboundMessage {
    /// Create a new inbound message.
    pub fn new(body: Value, reply_to: Box<dyn ReplyChannel>) -> Self {
        Self { body, reply_to }
    }
}

impl std::fmt::Debug for InboundMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundMessage")
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}
