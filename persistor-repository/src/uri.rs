//! Request paths for document-store operations.
//!
//! Paths are plain concatenations of the caller's segments. Nothing is escaped
//! or normalized here; callers supply valid path segments.

/// Path for a document operation: `index/type`, or `index/type/id` when an id
/// is given.
pub fn document_uri(index: &str, doc_type: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("{}/{}/{}", index, doc_type, id),
        None => format!("{}/{}", index, doc_type),
    }
}

/// Path for an index-level operation (creation, existence check).
pub fn index_uri(index: &str) -> String {
    index.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_uri_without_id() {
        assert_eq!(document_uri("users", "profile", None), "users/profile");
    }

    #[test]
    fn test_document_uri_with_id() {
        assert_eq!(
            document_uri("users", "profile", Some("42")),
            "users/profile/42"
        );
    }

    #[test]
    fn test_segments_are_not_escaped() {
        assert_eq!(
            document_uri("logs-2024.01", "event", Some("a b")),
            "logs-2024.01/event/a b"
        );
    }

    #[test]
    fn test_index_uri() {
        assert_eq!(index_uri("users"), "users");
    }
}
