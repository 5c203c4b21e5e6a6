//! Canonical state back into the current persisted shape, plus export payloads

use crate::versions::SCHEMA_VERSION;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use soc_model::{AppState, Assessment, Metadata, Theme, UiFlags, Workspace, WorkspaceId};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedV2<'a> {
    schema_version: u64,
    workspaces: &'a [Workspace],
    current_workspace_id: Option<&'a WorkspaceId>,
    current_assessment_id: &'a str,
    current_assessment: &'a Assessment,
    upcoming_metadata: &'a Metadata,
    active_aspect_key: Option<&'a str>,
    last_saved_at: Option<DateTime<Utc>>,
    theme: Theme,
    api_base: &'a str,
    model: &'a str,
    #[serde(flatten)]
    ui: &'a UiFlags,
}

/// Persistable projection of the state
///
/// The AI key, actions and transient flags are never written.
#[must_use]
pub fn dehydrate(state: &AppState) -> Value {
    let persisted = PersistedV2 {
        schema_version: SCHEMA_VERSION,
        workspaces: &state.workspaces,
        current_workspace_id: state.current_workspace_id.as_ref(),
        current_assessment_id: state.current_assessment.id.as_str(),
        current_assessment: &state.current_assessment,
        upcoming_metadata: &state.upcoming_metadata,
        active_aspect_key: state.active_aspect_key.as_deref(),
        last_saved_at: state.last_saved_at,
        theme: state.theme,
        api_base: &state.ai.api_base,
        model: &state.ai.model,
        ui: &state.ui,
    };
    serde_json::to_value(persisted).unwrap_or(Value::Null)
}

/// Single assessment as a downloadable document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentExport {
    pub schema_version: u64,
    pub exported_at: DateTime<Utc>,
    pub assessment: Assessment,
}

/// Whole workspace as a downloadable document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceExport {
    pub schema_version: u64,
    pub exported_at: DateTime<Utc>,
    pub workspace: Workspace,
}

/// Build an assessment export
#[must_use]
pub fn export_assessment(assessment: &Assessment, now: DateTime<Utc>) -> AssessmentExport {
    AssessmentExport {
        schema_version: SCHEMA_VERSION,
        exported_at: now,
        assessment: assessment.clone(),
    }
}

/// Build a workspace export
#[must_use]
pub fn export_workspace(workspace: &Workspace, now: DateTime<Utc>) -> WorkspaceExport {
    WorkspaceExport {
        schema_version: SCHEMA_VERSION,
        exported_at: now,
        workspace: workspace.clone(),
    }
}

/// Body of the one-shot local-to-server import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPayload {
    pub workspaces: Vec<Workspace>,
}

impl MigrationPayload {
    /// Number of assessments across all workspaces
    #[must_use]
    pub fn assessment_count(&self) -> usize {
        self.workspaces.iter().map(|w| w.assessments.len()).sum()
    }
}

/// Local workspaces in import form
///
/// A persisted-worthy current assessment missing from its workspace is
/// folded in so an unsaved edit is not lost by the import.
#[must_use]
pub fn migration_payload(state: &AppState) -> MigrationPayload {
    let mut workspaces = state.workspaces.clone();
    let current = &state.current_assessment;
    if current.has_user_content() {
        if let Some(ws) = state
            .current_workspace_id
            .as_ref()
            .and_then(|id| workspaces.iter_mut().find(|w| &w.id == id))
        {
            if !ws.contains(&current.id) {
                ws.assessments.push(current.clone());
            }
        }
    }
    MigrationPayload { workspaces }
}
