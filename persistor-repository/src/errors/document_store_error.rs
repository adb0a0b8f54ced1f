//! Document-store error types.
//!
//! This module defines the unified error type for a single request/response
//! exchange with the document store, from validating the inbound request to
//! decoding the response body.

use thiserror::Error;

/// Unified errors from document-store operations.
///
/// Every variant is local to one exchange. None of them are retried and none
/// of them stop the persistor from serving later messages. The `Display` form
/// of each variant is the message put in an error reply.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DocumentStoreError {
    /// The inbound request is missing an action, names an unknown action or
    /// lacks a required field. No HTTP call is made.
    #[error("{0}")]
    ValidationError(String),

    /// The document could not be encoded as UTF-8 JSON text.
    #[error("unable to encode command body: {0}")]
    EncodingError(String),

    /// The document store answered with a status outside [200, 300].
    #[error("{context}: {status_line}")]
    TransportError {
        /// What was being attempted, e.g. "error indexing object".
        context: String,
        /// The HTTP status code.
        status: u16,
        /// Status code followed by the status text, e.g. "409 Conflict".
        status_line: String,
    },

    /// The document store answered 2xx but the body is not valid JSON.
    #[error("{context}: invalid JSON in {status} response: {reason}")]
    DecodingError {
        /// What was being attempted.
        context: String,
        /// The HTTP status code.
        status: u16,
        /// The JSON parser's description of the problem.
        reason: String,
    },

    /// The HTTP exchange itself failed (connection refused, reset, timeout).
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl DocumentStoreError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create an encoding error.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::EncodingError(msg.into())
    }

    /// Create a transport error for a non-success status.
    pub fn transport(context: impl Into<String>, status: u16, reason: Option<&str>) -> Self {
        let status_line = match reason {
            Some(reason) if !reason.is_empty() => format!("{} {}", status, reason),
            _ => status.to_string(),
        };
        Self::TransportError {
            context: context.into(),
            status,
            status_line,
        }
    }

    /// Create a decoding error for a success status with an unreadable body.
    pub fn decoding(context: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        Self::DecodingError {
            context: context.into(),
            status,
            reason: reason.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Short name of the error class, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "validation",
            Self::EncodingError(_) => "encoding",
            Self::TransportError { .. } => "transport",
            Self::DecodingError { .. } => "decoding",
            Self::ConnectionError(_) => "connection",
        }
    }
}
