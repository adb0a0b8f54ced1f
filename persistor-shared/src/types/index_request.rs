//! Document indexing requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request to store one document.
///
/// When `id` is absent the document store assigns the id (create); when it is
/// present the document is written at that id (upsert).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexRequest {
    /// Target index name.
    pub index: String,
    /// Document type within the index.
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Optional document id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The document itself.
    pub object: Value,
}

impl IndexRequest {
    /// Create a request without an id; the store assigns one.
    pub fn create(index: impl Into<String>, doc_type: impl Into<String>, object: Value) -> Self {
        Self {
            index: index.into(),
            doc_type: doc_type.into(),
            id: None,
            object,
        }
    }

    /// Create a request that writes the document at `id`.
    pub fn upsert(
        index: impl Into<String>,
        doc_type: impl Into<String>,
        id: impl Into<String>,
        object: Value,
    ) -> Self {
        Self {
            index: index.into(),
            doc_type: doc_type.into(),
            id: Some(id.into()),
            object,
        }
    }

    /// Whether this request targets an explicit document id.
    pub fn is_upsert(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_uses_type_field() {
        let request = IndexRequest::upsert("users", "profile", "42", json!({"name": "Ada"}));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["type"], "profile");
        assert_eq!(value["id"], "42");
        assert!(value.get("doc_type").is_none());
    }

    #[test]
    fn test_create_has_no_id() {
        let request = IndexRequest::create("users", "profile", json!({}));
        assert!(!request.is_upsert());

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("id").is_none());
    }
}
