//! Actions understood by the persistor.

use serde::{Deserialize, Serialize};

/// The operation keyword carried in the `action` field of an inbound message.
///
/// Only document indexing is message-driven. Index creation happens at startup
/// and is never selected by a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Store a single document, creating or replacing it.
    Index,
}

impl Action {
    /// Resolve an action keyword. Matching is exact and case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "index" => Some(Action::Index),
            _ => None,
        }
    }

    /// Returns the keyword as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Index => "index",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Action::from_name("index"), Some(Action::Index));
        assert_eq!(Action::from_name("delete"), None);
        assert_eq!(Action::from_name("Index"), None);
        assert_eq!(Action::from_name(""), None);
    }

    #[test]
    fn test_display_matches_wire_name() {
        assert_eq!(Action::Index.to_string(), "index");
        assert_eq!(serde_json::to_string(&Action::Index).unwrap(), "\"index\"");
    }
}
