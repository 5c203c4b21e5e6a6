//! Raw persisted shapes, one per app generation
//!
//! Detection looks only at the top-level keys:
//!
//! - `schemaVersion: 2` or a `workspaces` array: workspace store (v2)
//! - `currentAssessment` / `assessmentHistory`: single-user history (v1)
//! - any other object: a bare assessment written by the first release (v0)

use crate::lenient::{lenient, lenient_text};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use soc_model::Theme;
use std::collections::BTreeMap;

/// Schema version written by [`crate::dehydrate`]
pub const SCHEMA_VERSION: u64 = 2;

/// Assessment as found on disk; every field optional and type-tolerant
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawAssessment {
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) framework_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) answers: Option<Map<String, Value>>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) notes: Option<Map<String, Value>>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) soctom_data: Option<Map<String, Value>>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) metadata: Option<RawMetadata>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) action_plan: Option<RawActionPlan>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) aspect_recommendations: Option<Map<String, Value>>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawMetadata {
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) assessment_title: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) budget_amount: Option<String>,
    /// Pre-split budget field of early releases
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) budget: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) budget_currency: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) size: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) sector: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) soc_age: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) objectives: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) status: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) language: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawActionPlan {
    #[serde(deserialize_with = "lenient")]
    pub(crate) steps: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) raw: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawWorkspace {
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) assessments: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

/// Top-level fields shared by every generation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawShell {
    #[serde(deserialize_with = "lenient")]
    pub(crate) upcoming_metadata: Option<RawMetadata>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) active_aspect_key: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) last_saved_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) theme: Option<Theme>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) api_base: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) model: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) sidebar_collapsed: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) sidebar_assessment_collapsed: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) sidebar_administration_collapsed: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) sidebar_domain_collapsed: Option<BTreeMap<String, bool>>,
}

/// v0: the blob is itself an assessment
#[derive(Debug, Clone, Default)]
pub(crate) struct LegacyStore {
    pub(crate) assessment: RawAssessment,
    pub(crate) shell: RawShell,
}

/// v1: one current assessment plus a flat history
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct HistoryStore {
    #[serde(deserialize_with = "lenient")]
    pub(crate) current_assessment: Option<RawAssessment>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) assessment_history: Option<Vec<Value>>,
    #[serde(skip)]
    pub(crate) shell: RawShell,
}

/// v2: workspaces owning assessments
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WorkspaceStore {
    #[serde(deserialize_with = "lenient")]
    pub(crate) workspaces: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) current_workspace_id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub(crate) current_assessment_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub(crate) current_assessment: Option<RawAssessment>,
    #[serde(skip)]
    pub(crate) shell: RawShell,
}

/// A persisted blob classified by generation
#[derive(Debug, Clone)]
pub(crate) enum PersistedState {
    Empty,
    V0(LegacyStore),
    V1(HistoryStore),
    V2(WorkspaceStore),
}

impl PersistedState {
    /// Classify a blob; non-objects are treated as absent
    pub(crate) fn detect(blob: Option<&Value>) -> Self {
        let Some(object) = blob.and_then(Value::as_object) else {
            return Self::Empty;
        };
        let value = Value::Object(object.clone());
        let shell: RawShell = decode(&value);

        let versioned = object.get("schemaVersion").and_then(Value::as_u64) == Some(SCHEMA_VERSION);
        if versioned || object.get("workspaces").is_some_and(Value::is_array) {
            return Self::V2(WorkspaceStore {
                shell,
                ..decode(&value)
            });
        }
        if object.contains_key("currentAssessment") || object.contains_key("assessmentHistory") {
            return Self::V1(HistoryStore {
                shell,
                ..decode(&value)
            });
        }
        if object.is_empty() {
            return Self::Empty;
        }
        Self::V0(LegacyStore {
            assessment: decode(&value),
            shell,
        })
    }

    /// Short label for logs
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::V0(_) => "v0",
            Self::V1(_) => "v1",
            Self::V2(_) => "v2",
        }
    }
}

/// Decode a lenient struct; only fails on non-objects, which fall back to default
fn decode<T: Default + serde::de::DeserializeOwned>(value: &Value) -> T {
    serde_json::from_value(value.clone()).unwrap_or_default()
}
