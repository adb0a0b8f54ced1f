//! Replies sent back to the requester of an inbound message.

use serde_json::{json, Value};

/// The outcome returned on a message's reply channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The document store's decoded response body, forwarded unchanged.
    Ok(Value),
    /// A failure description.
    Error { message: String },
}

impl Reply {
    /// Create a success reply.
    pub fn ok(body: Value) -> Self {
        Self::Ok(body)
    }

    /// Create an error reply.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Returns true for a success reply.
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_))
    }

    /// The error message, if this is an error reply.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Reply::Ok(_) => None,
            Reply::Error { message } => Some(message),
        }
    }

    /// Convert into the JSON payload put on the bus.
    ///
    /// Success replies are the raw body; errors are
    /// `{"status": "error", "message": ...}`.
    pub fn into_json(self) -> Value {
        match self {
            Reply::Ok(body) => body,
            Reply::Error { message } => json!({
                "status": "error",
                "message": message,
            }),
        }
    }
}
