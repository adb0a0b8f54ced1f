//! JSON request encoding.
//!
//! Serializes a document to UTF-8 JSON bytes and produces the framing the
//! document store's HTTP API expects. Encoding is the only local failure of a
//! request and is never retried.

use serde::Serialize;

use crate::errors::DocumentStoreError;
use crate::types::EncodedBody;

/// Content type of every body sent to the document store.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Encode a value as a UTF-8 JSON body.
///
/// # Returns
///
/// * `Ok(EncodedBody)` - The bytes plus `Content-Type: application/json`;
///   `Content-Length` is the byte count, not the character count
/// * `Err(DocumentStoreError::EncodingError)` - If the value has no JSON text form
///
/// # Example
///
/// ```
/// use persistor_repository::encoding::encode_json;
/// use serde_json::json;
///
/// let body = encode_json(&json!({"name": "Ada"})).unwrap();
/// assert_eq!(body.bytes, br#"{"name":"Ada"}"#);
/// assert_eq!(body.content_length(), 14);
/// ```
pub fn encode_json<T>(value: &T) -> Result<EncodedBody, DocumentStoreError>
where
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec(value).map_err(|e| DocumentStoreError::encoding(e.to_string()))?;

    Ok(EncodedBody {
        bytes,
        content_type: JSON_CONTENT_TYPE,
    })
}
