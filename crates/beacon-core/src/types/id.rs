//! Newtype wrappers around document identifiers.
//!
//! The roster store is document-oriented and keys documents by string
//! identifiers. Using distinct types prevents accidentally passing a
//! `MemberId` where a `UserId` is expected. Identifiers minted locally
//! (the unauthenticated pseudo-identity, the degraded-mode roster entry)
//! are random UUIDv4 strings; identifiers assigned by the store are kept
//! verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to define a newtype ID wrapper around a document identifier.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Mint a new locally generated identifier (random UUIDv4).
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Create an identifier from an existing string value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Return the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user (authenticated or pseudo-identity).
    UserId
);

define_id!(
    /// Unique identifier for a roster entry (family member).
    MemberId
);

define_id!(
    /// Unique identifier for an emergency alert document.
    AlertId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        let id1 = MemberId::generate();
        let id2 = MemberId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_display_roundtrip() {
        let id = UserId::new("user-42");
        assert_eq!(id.to_string(), "user-42");
        assert_eq!(UserId::from("user-42"), id);
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = AlertId::new("a1");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"a1\"");
        let parsed: AlertId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, parsed);
    }
}
