//! Request and response types for document-store HTTP exchanges.

use serde::Serialize;
use serde_json::Value;

use crate::encoding::encode_json;
use crate::errors::DocumentStoreError;

/// HTTP methods the persistor issues against the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Create a document with a server-assigned id, or create an index.
    Post,
    /// Write a document at an explicit id.
    Put,
    /// Check whether an index exists.
    Head,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A JSON body encoded as UTF-8 bytes together with its framing headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    /// UTF-8 JSON bytes.
    pub bytes: Vec<u8>,
    /// Value of the `Content-Type` header.
    pub content_type: &'static str,
}

impl EncodedBody {
    /// Value of the `Content-Length` header: the UTF-8 byte count.
    pub fn content_length(&self) -> usize {
        self.bytes.len()
    }
}

/// A fully-built HTTP call: method, path relative to the store's base URL,
/// and an optional framed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCall {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path, without a leading slash.
    pub path: String,
    /// Framed body, if the call carries one.
    pub body: Option<EncodedBody>,
}

impl OutboundCall {
    /// Create a call without a body.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// Attach a framed body.
    pub fn with_body(mut self, body: EncodedBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Encode `document` as JSON and attach it as the body.
    pub fn with_json_body<T>(self, document: &T) -> Result<Self, DocumentStoreError>
    where
        T: Serialize + ?Sized,
    {
        Ok(self.with_body(encode_json(document)?))
    }

    /// The framing headers for this call.
    ///
    /// Calls with a body carry `Content-Type` and `Content-Length`; calls
    /// without one carry no headers.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match &self.body {
            Some(body) => vec![
                ("Content-Type", body.content_type.to_string()),
                ("Content-Length", body.content_length().to_string()),
            ],
            None => Vec::new(),
        }
    }
}

/// A fully-buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Status text, when the transport knows it.
    pub reason: Option<String>,
    /// The complete response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Create a response from its parts.
    pub fn new(status: u16, reason: Option<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason,
            body: body.into(),
        }
    }
}

/// Result of ensuring a startup index exists.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexCreation {
    /// The index was already present; nothing was sent.
    AlreadyExists,
    /// The index was created; carries the store's response body.
    Created(Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_for_body() {
        let call = OutboundCall::new(HttpMethod::Put, "users/profile/42").with_body(EncodedBody {
            bytes: b"{\"a\":1}".to_vec(),
            content_type: "application/json",
        });

        assert_eq!(
            call.headers(),
            vec![
                ("Content-Type", "application/json".to_string()),
                ("Content-Length", "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_headers_without_body() {
        let call = OutboundCall::new(HttpMethod::Head, "users");
        assert!(call.headers().is_empty());
    }

    #[test]
    fn test_method_names() {
        assert_eq!(HttpMethod::Post.to_string(), "POST");
        assert_eq!(HttpMethod::Put.to_string(), "PUT");
        assert_eq!(HttpMethod::Head.to_string(), "HEAD");
    }
}
