//! Response interpretation.
//!
//! Classifies a fully-buffered document-store response into a decoded JSON
//! payload or a typed failure. A 2xx response with an unreadable body is a
//! `DecodingError`, never a success and never a `TransportError`.

use serde_json::Value;

use crate::errors::DocumentStoreError;
use crate::types::TransportResponse;

/// Whether a status code counts as success. The upper bound is inclusive.
pub fn is_success(status: u16) -> bool {
    (200..=300).contains(&status)
}

/// Interpret a response.
///
/// # Arguments
///
/// * `context` - Prefix for failure messages, e.g. "error indexing object"
/// * `response` - The complete response
///
/// # Returns
///
/// * `Ok(Value)` - Status in [200, 300] and the body parsed as JSON
/// * `Err(DocumentStoreError::TransportError)` - Any other status
/// * `Err(DocumentStoreError::DecodingError)` - Success status, body not JSON
pub fn interpret(context: &str, response: &TransportResponse) -> Result<Value, DocumentStoreError> {
    if !is_success(response.status) {
        return Err(DocumentStoreError::transport(
            context,
            response.status,
            response.reason.as_deref(),
        ));
    }

    serde_json::from_slice(&response.body)
        .map_err(|e| DocumentStoreError::decoding(context, response.status, e.to_string()))
}
