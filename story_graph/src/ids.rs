//! Identifier newtypes for graph elements.
//!
//! Ids are supplied by the authoring layer as plain strings. Builders that
//! create elements on the fly mint a fresh UUID v4 string instead.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an existing id string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Mint a fresh random id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Unique identifier for narrative and choice nodes.
    NodeId
);
string_id!(
    /// Unique identifier for links between nodes.
    LinkId
);
string_id!(
    /// Unique identifier for condition groups.
    GroupId
);
string_id!(
    /// Unique identifier for story variables.
    VariableId
);
string_id!(
    /// Unique identifier for variable operations.
    OperationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_str_and_display() {
        let id = NodeId::from("start");
        assert_eq!(id.as_str(), "start");
        assert_eq!(id.to_string(), "start");
        assert_eq!(id, NodeId::new("start"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = LinkId::generate();
        let b = LinkId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = VariableId::from("score");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"score\"");
    }
}
