//! Hydration errors

use thiserror::Error;

/// Failures surfaced when reading external documents
///
/// Persisted app state never fails to hydrate; these only cover inputs that
/// must be well-formed, such as imported files.
#[derive(Debug, Error)]
pub enum HydrateError {
    /// Input is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Input is JSON but carries nothing importable
    #[error("document does not contain {0}")]
    Missing(&'static str),
}
