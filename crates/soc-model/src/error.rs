//! Error types for the canonical model

/// Errors raised while building or validating model values
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Framework taxonomy could not be decoded
    #[error("invalid framework '{id}': {source}")]
    InvalidFramework {
        /// Framework id being loaded
        id: String,
        /// Underlying decode failure
        #[source]
        source: serde_json::Error,
    },

    /// A required field was missing or blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A value fell outside what the schema accepts
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// Human-readable reason
        reason: String,
    },
}

impl ModelError {
    /// Create invalid-value error for a field
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_display() {
        let err = ModelError::MissingField("title");
        assert_eq!(err.to_string(), "title is required");
    }

    #[test]
    fn invalid_value_display() {
        let err = ModelError::invalid("actions", "at most 20 per request");
        assert!(err.to_string().contains("at most 20"));
    }
}
