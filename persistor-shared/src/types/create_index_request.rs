//! Index definitions created when the persistor starts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An index to create at startup, as listed in the `indices` configuration.
///
/// ```
/// use persistor_shared::CreateIndexRequest;
///
/// let request: CreateIndexRequest = serde_json::from_str(
///     r#"{"index": "users", "configuration": {"settings": {"number_of_shards": 1}}}"#,
/// ).unwrap();
/// assert_eq!(request.index, "users");
/// assert!(request.configuration.is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateIndexRequest {
    /// Name of the index.
    pub index: String,
    /// Settings and mappings document sent as the creation body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Value>,
}

impl CreateIndexRequest {
    /// Create a request for an index with default settings.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            configuration: None,
        }
    }

    /// Create a request carrying an explicit settings document.
    pub fn with_configuration(index: impl Into<String>, configuration: Value) -> Self {
        Self {
            index: index.into(),
            configuration: Some(configuration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_without_configuration() {
        let request: CreateIndexRequest = serde_json::from_value(json!({"index": "logs"})).unwrap();
        assert_eq!(request, CreateIndexRequest::new("logs"));
    }

    #[test]
    fn test_deserialize_requires_index() {
        let result = serde_json::from_value::<CreateIndexRequest>(json!({"configuration": {}}));
        assert!(result.is_err());
    }
}
