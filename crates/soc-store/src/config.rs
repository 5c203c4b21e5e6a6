//! Store configuration

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use soc_hydrate::HydrateOptions;
use std::path::Path;
use std::time::Duration;

/// Store configuration
///
/// Loadable from TOML; every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Quiet period before an edit is auto-saved, in milliseconds
    pub auto_save_debounce_ms: u64,
    /// Maximum actions per bulk create request
    pub max_bulk_actions: usize,
    /// Framework used for new drafts
    pub default_framework_id: String,
    /// Name of synthesized workspaces
    pub default_workspace_name: String,
    /// Generative-text service settings
    pub ai: AiDefaults,
}

/// Endpoint defaults for the generative-text service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiDefaults {
    /// API base URL
    pub api_base: String,
    /// Model name
    pub model: String,
}

impl Default for AiDefaults {
    fn default() -> Self {
        Self {
            api_base: "https://api.x.ai/v1".to_string(),
            model: "grok-4-latest".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            auto_save_debounce_ms: 800,
            max_bulk_actions: 20,
            default_framework_id: "soc_cmm".to_string(),
            default_workspace_name: "Default Workspace".to_string(),
            ai: AiDefaults::default(),
        }
    }
}

impl StoreConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With auto-save debounce
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.auto_save_debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With bulk action limit
    #[inline]
    #[must_use]
    pub fn with_max_bulk_actions(mut self, max: usize) -> Self {
        self.max_bulk_actions = max;
        self
    }

    /// With default framework
    #[inline]
    #[must_use]
    pub fn with_default_framework(mut self, framework_id: impl Into<String>) -> Self {
        self.default_framework_id = framework_id.into();
        self
    }

    /// With name for synthesized workspaces
    #[inline]
    #[must_use]
    pub fn with_default_workspace_name(mut self, name: impl Into<String>) -> Self {
        self.default_workspace_name = name.into();
        self
    }

    /// With generative-text endpoint
    #[inline]
    #[must_use]
    pub fn with_ai(mut self, api_base: impl Into<String>, model: impl Into<String>) -> Self {
        self.ai = AiDefaults {
            api_base: api_base.into(),
            model: model.into(),
        };
        self
    }

    /// Auto-save debounce as a duration
    #[inline]
    #[must_use]
    pub fn auto_save_debounce(&self) -> Duration {
        Duration::from_millis(self.auto_save_debounce_ms)
    }

    /// Defaults handed to hydration
    #[must_use]
    pub fn hydrate_options(&self) -> HydrateOptions {
        HydrateOptions {
            default_framework_id: self.default_framework_id.clone(),
            default_workspace_name: self.default_workspace_name.clone(),
            api_base: self.ai.api_base.clone(),
            model: self.ai.model.clone(),
        }
    }

    /// Parse from TOML text
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] when the text is not valid TOML or a
    /// value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self, StoreError> {
        let config: Self = toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] naming the first invalid key.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.max_bulk_actions == 0 {
            return Err(StoreError::Config("max_bulk_actions must be at least 1".into()));
        }
        if self.default_framework_id.trim().is_empty() {
            return Err(StoreError::Config("default_framework_id is empty".into()));
        }
        if self.default_workspace_name.trim().is_empty() {
            return Err(StoreError::Config("default_workspace_name is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StoreConfig::new();
        assert_eq!(config.auto_save_debounce(), Duration::from_millis(800));
        assert_eq!(config.max_bulk_actions, 20);
        assert_eq!(config.hydrate_options(), HydrateOptions::default());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = StoreConfig::from_toml_str(
            r#"
            auto_save_debounce_ms = 250
            [ai]
            model = "local-model"
            "#,
        )
        .unwrap();
        assert_eq!(config.auto_save_debounce_ms, 250);
        assert_eq!(config.ai.model, "local-model");
        assert_eq!(config.ai.api_base, "https://api.x.ai/v1");
        assert_eq!(config.default_framework_id, "soc_cmm");
    }

    #[test]
    fn rejects_zero_bulk_limit() {
        let err = StoreConfig::from_toml_str("max_bulk_actions = 0").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn builders_chain() {
        let config = StoreConfig::new()
            .with_debounce(Duration::from_millis(5))
            .with_default_framework("sim3")
            .with_max_bulk_actions(3);
        assert_eq!(config.auto_save_debounce_ms, 5);
        assert_eq!(config.default_framework_id, "sim3");
        assert_eq!(config.max_bulk_actions, 3);
    }
}
