//! Error types for the state container
//!
//! Mirrors the failure taxonomy of the sync protocol:
//! - Validation: malformed local input, rejected before any remote call
//! - Remote: the persistence service rejected an already-applied mutation
//! - NotFound: a referenced id no longer resolves
//! - AI: the generative-text collaborator failed
//!
//! Duplicate ids are never an error; they are pruned during reconciliation.

use soc_hydrate::HydrateError;
use soc_model::ModelError;
use std::fmt;

/// Machine-checkable category of a remote rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// Entity does not exist remotely
    NotFound,
    /// Conflicting concurrent write
    Conflict,
    /// Server-side validation failed
    Validation,
    /// Network or protocol failure
    Transport,
    /// Anything else
    Other,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::Other => "remote error",
        })
    }
}

/// Rejection returned by a [`crate::RemoteClient`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    /// Category
    pub kind: RemoteErrorKind,
    /// Human-readable message
    pub message: String,
}

impl RemoteError {
    /// Create a remote error
    #[must_use]
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Not-found rejection
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    /// Transport failure
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Transport, message)
    }
}

/// Failure of the generative-text collaborator
///
/// Distinct from an empty result, which is a successful call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiError {
    /// Provider rejected or could not be reached
    #[error("generation request failed: {0}")]
    Request(String),

    /// Credentials were refused
    #[error("the API key or endpoint was rejected")]
    Unauthorized,

    /// Response could not be interpreted
    #[error("malformed generation response: {0}")]
    Malformed(String),
}

/// Main store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Local input rejected before any state change
    #[error("validation failed: {0}")]
    Validation(String),

    /// Remote rejection after the optimistic phase
    #[error("remote rejected the request: {0}")]
    Remote(#[from] RemoteError),

    /// Referenced entity does not resolve locally
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Requested id
        id: String,
    },

    /// Framework id absent from the catalog
    #[error("unknown framework: {0}")]
    UnknownFramework(String),

    /// Generative-text failure
    #[error("action plan generation failed: {0}")]
    Ai(#[from] AiError),

    /// JSON encoding or decoding failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Imported document could not be read
    #[error("import failed: {0}")]
    Import(#[from] HydrateError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<ModelError> for StoreError {
    fn from(error: ModelError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl StoreError {
    /// Shorthand for a validation failure
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the entity is missing locally or remotely
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Remote(remote) => remote.kind == RemoteErrorKind::NotFound,
            _ => false,
        }
    }

    /// Whether the error came from the persistence service
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Whether the input was rejected locally
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_display_includes_kind() {
        let err = RemoteError::not_found("workspace w1");
        assert_eq!(err.to_string(), "not found: workspace w1");
    }

    #[test]
    fn predicates() {
        let err: StoreError = RemoteError::not_found("x").into();
        assert!(err.is_not_found());
        assert!(err.is_remote());

        let err: StoreError = ModelError::MissingField("title").into();
        assert!(err.is_validation());
        assert!(!err.is_remote());
    }
}
