//! SOC Hydrate - persisted state in, canonical state out
//!
//! Accepts every persisted shape the app has ever written and produces one
//! canonical [`AppState`]:
//! - Generation detection (bare assessment, history, workspaces)
//! - Field-level leniency: wrongly typed values are dropped, then backfilled
//! - Legacy fallback chains for titles and budgets
//! - Current-workspace and current-assessment selection
//!
//! Hydration is total and idempotent: `hydrate(dehydrate(hydrate(x)))` equals
//! `hydrate(x)` for any input.
//!
//! ```rust
//! use soc_hydrate::{dehydrate, hydrate, HydrateOptions};
//! use serde_json::json;
//!
//! let options = HydrateOptions::default();
//! let state = hydrate(Some(&json!({"answers": {"1.1": "Yes"}})), &options);
//! assert_eq!(state.current_assessment.answers["1.1"], "Yes");
//! assert_eq!(hydrate(Some(&dehydrate(&state)), &options), state);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod dehydrate;
mod error;
mod lenient;
mod migrate;
mod normalize;
mod versions;

use chrono::{DateTime, Utc};
use serde_json::Value;
use soc_model::{AiSettings, AppState, Assessment};
use versions::PersistedState;

pub use dehydrate::{
    dehydrate, export_assessment, export_workspace, migration_payload, AssessmentExport,
    MigrationPayload, WorkspaceExport,
};
pub use error::HydrateError;
pub use versions::SCHEMA_VERSION;

/// Defaults applied where a persisted blob is silent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydrateOptions {
    /// Framework for assessments without one
    pub default_framework_id: String,
    /// Name of synthesized workspaces
    pub default_workspace_name: String,
    /// Endpoint of the generative-text service
    pub api_base: String,
    /// Model requested from the generative-text service
    pub model: String,
}

impl Default for HydrateOptions {
    fn default() -> Self {
        Self {
            default_framework_id: "soc_cmm".to_string(),
            default_workspace_name: "Default Workspace".to_string(),
            api_base: "https://api.x.ai/v1".to_string(),
            model: "grok-4-latest".to_string(),
        }
    }
}

/// Hydrate with the current time for synthesized timestamps
#[must_use]
pub fn hydrate(blob: Option<&Value>, options: &HydrateOptions) -> AppState {
    hydrate_at(blob, options, Utc::now())
}

/// Hydrate using `now` for any timestamp that has to be invented
#[must_use]
pub fn hydrate_at(blob: Option<&Value>, options: &HydrateOptions, now: DateTime<Utc>) -> AppState {
    let persisted = PersistedState::detect(blob);
    tracing::debug!(generation = persisted.label(), "hydrating persisted state");

    match persisted {
        PersistedState::Empty => AppState::fresh(
            &options.default_framework_id,
            &options.default_workspace_name,
            AiSettings {
                api_key: String::new(),
                api_base: options.api_base.clone(),
                model: options.model.clone(),
            },
            now,
        ),
        PersistedState::V0(legacy) => {
            let v2 = migrate::v1_to_v2(migrate::v0_to_v1(legacy), options);
            migrate::canonicalize(v2, options, now)
        }
        PersistedState::V1(history) => {
            migrate::canonicalize(migrate::v1_to_v2(history, options), options, now)
        }
        PersistedState::V2(store) => migrate::canonicalize(store, options, now),
    }
}

/// Hydrate from persisted text; unparseable text yields a fresh state
#[must_use]
pub fn hydrate_str(text: &str, options: &HydrateOptions) -> AppState {
    match serde_json::from_str::<Value>(text) {
        Ok(blob) => hydrate(Some(&blob), options),
        Err(error) => {
            tracing::warn!(%error, "persisted state is not JSON, starting fresh");
            hydrate(None, options)
        }
    }
}

/// Read an exported assessment, or a bare assessment object
///
/// # Errors
///
/// Returns [`HydrateError::Json`] for malformed text and
/// [`HydrateError::Missing`] when no assessment object is present.
pub fn import_assessment(text: &str, options: &HydrateOptions) -> Result<Assessment, HydrateError> {
    let value: Value = serde_json::from_str(text)?;
    let body = match value.get("assessment") {
        Some(inner) => inner.clone(),
        None => value,
    };
    if !body.is_object() {
        return Err(HydrateError::Missing("an assessment"));
    }
    migrate::assessment_value(body, options).ok_or(HydrateError::Missing("an assessment"))
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
