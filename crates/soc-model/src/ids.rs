//! Identifier newtypes
//!
//! Server-issued ids are opaque strings. Client-generated ids embed a ULID so
//! they sort by creation time. Optimistic placeholders start with
//! [`TEMP_PREFIX`] and never collide with server ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Prefix carried by every locally-tagged temporary id
pub const TEMP_PREFIX: &str = "temp-";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing id
            #[inline]
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Generate a fresh client-side id
            #[inline]
            #[must_use]
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, Ulid::new()))
            }

            /// Generate a placeholder id for an optimistic insert
            #[inline]
            #[must_use]
            pub fn temporary() -> Self {
                Self(format!("{}{}-{}", TEMP_PREFIX, $prefix, Ulid::new()))
            }

            /// Whether this id was minted for an unconfirmed optimistic insert
            #[inline]
            #[must_use]
            pub fn is_temporary(&self) -> bool {
                self.0.starts_with(TEMP_PREFIX)
            }

            /// Borrow the raw id
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Workspace identifier
    WorkspaceId,
    "workspace"
);

string_id!(
    /// Assessment identifier
    AssessmentId,
    "assessment"
);

string_id!(
    /// Action identifier
    ActionId,
    "action"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_not_temporary() {
        let id = AssessmentId::generate();
        assert!(id.as_str().starts_with("assessment-"));
        assert!(!id.is_temporary());
    }

    #[test]
    fn temporary_ids_are_detectable() {
        let id = WorkspaceId::temporary();
        assert!(id.is_temporary());
        assert_ne!(id, WorkspaceId::temporary());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ActionId::new("action-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"action-1\"");
    }
}
