//! Generation-by-generation upgrades to the canonical state
//!
//! Each step lifts one generation to the next; only the last step knows about
//! [`AppState`]. Older blobs are never rewritten in place.

use crate::normalize;
use crate::versions::{
    HistoryStore, LegacyStore, RawAssessment, RawShell, RawWorkspace, WorkspaceStore,
};
use crate::HydrateOptions;
use chrono::{DateTime, Utc};
use serde_json::Value;
use soc_model::{AiSettings, AppState, Assessment, AssessmentId, UiFlags, Workspace, WorkspaceId};
use std::collections::{BTreeMap, BTreeSet};

/// v0 -> v1: the bare assessment becomes the current one, history stays empty
pub(crate) fn v0_to_v1(legacy: LegacyStore) -> HistoryStore {
    HistoryStore {
        current_assessment: Some(legacy.assessment),
        assessment_history: None,
        shell: legacy.shell,
    }
}

/// v1 -> v2: history moves into one synthesized workspace
///
/// A current assessment without an id is given one here so the pointer in
/// the v2 shape can name it.
pub(crate) fn v1_to_v2(history: HistoryStore, options: &HydrateOptions) -> WorkspaceStore {
    let mut current = history.current_assessment;
    let current_id = current.as_mut().map(|raw| {
        raw.id
            .get_or_insert_with(|| AssessmentId::generate().to_string())
            .clone()
    });

    let workspace = serde_json::json!({
        "id": WorkspaceId::generate(),
        "name": options.default_workspace_name,
        "assessments": history.assessment_history.unwrap_or_default(),
    });

    WorkspaceStore {
        workspaces: Some(vec![workspace]),
        current_workspace_id: None,
        current_assessment_id: current_id,
        current_assessment: current,
        shell: history.shell,
    }
}

/// v2 -> canonical state
pub(crate) fn canonicalize(
    store: WorkspaceStore,
    options: &HydrateOptions,
    now: DateTime<Utc>,
) -> AppState {
    let WorkspaceStore {
        workspaces,
        current_workspace_id,
        current_assessment_id,
        current_assessment,
        shell,
    } = store;

    let mut workspaces: Vec<Workspace> = crate::lenient::each::<RawWorkspace>(workspaces)
        .into_iter()
        .map(|raw| normalize::workspace(raw, options, now))
        .collect();
    if workspaces.is_empty() {
        workspaces.push(Workspace::new(
            WorkspaceId::generate(),
            options.default_workspace_name.clone(),
            now,
        ));
    }

    let upcoming_metadata = normalize::metadata(shell.upcoming_metadata.clone());
    let persisted = current_assessment.map(|raw| normalize::assessment(raw, options));
    let wanted = current_assessment_id
        .filter(|id| !id.trim().is_empty())
        .map(AssessmentId::from)
        .or_else(|| persisted.as_ref().map(|a| a.id.clone()));

    let mut state = AppState {
        workspaces,
        current_workspace_id: None,
        current_assessment: Assessment::draft(
            options.default_framework_id.clone(),
            upcoming_metadata.clone(),
        ),
        upcoming_metadata,
        active_aspect_key: None,
        ui: ui_flags(&shell),
        theme: shell.theme.unwrap_or_default(),
        ai: AiSettings {
            api_key: String::new(),
            api_base: crate::lenient::non_blank(shell.api_base)
                .unwrap_or_else(|| options.api_base.clone()),
            model: crate::lenient::non_blank(shell.model).unwrap_or_else(|| options.model.clone()),
        },
        last_saved_at: shell.last_saved_at,
        skip_next_auto_save: false,
        actions_by_assessment_id: BTreeMap::new(),
        pending_creates: BTreeSet::new(),
    };
    state.reconcile();

    let workspace_id = current_workspace_id
        .map(WorkspaceId::from)
        .filter(|id| state.workspace(id).is_some())
        .unwrap_or_else(|| state.workspaces[0].id.clone());
    let chosen = state
        .workspace(&workspace_id)
        .and_then(|ws| select_current(ws, wanted.as_ref(), persisted.as_ref()));
    let current = chosen
        .or(persisted)
        .unwrap_or_else(|| state.current_assessment.clone());

    state.current_workspace_id = Some(workspace_id);
    state.current_assessment = current;
    state.active_aspect_key = shell.active_aspect_key.filter(|k| !k.trim().is_empty());
    state
}

/// Current-assessment precedence inside the chosen workspace
///
/// 1. the requested id, preferring the persisted body when it matches
/// 2. the most recently saved assessment
///
/// `None` leaves the caller to fall back to the persisted draft (workspace
/// empty) or a fresh draft.
fn select_current(
    workspace: &Workspace,
    wanted: Option<&AssessmentId>,
    persisted: Option<&Assessment>,
) -> Option<Assessment> {
    if let Some(id) = wanted {
        if let Some(found) = workspace.assessment(id) {
            return Some(match persisted {
                Some(body) if &body.id == id => body.clone(),
                _ => found.clone(),
            });
        }
    }
    workspace.most_recent_assessment().cloned()
}

fn ui_flags(shell: &RawShell) -> UiFlags {
    UiFlags {
        sidebar_collapsed: shell.sidebar_collapsed.unwrap_or_default(),
        sidebar_assessment_collapsed: shell.sidebar_assessment_collapsed.unwrap_or_default(),
        sidebar_administration_collapsed: shell
            .sidebar_administration_collapsed
            .unwrap_or_default(),
        sidebar_domain_collapsed: shell.sidebar_domain_collapsed.clone().unwrap_or_default(),
    }
}

/// Lift a raw assessment value straight to canonical form
pub(crate) fn assessment_value(value: Value, options: &HydrateOptions) -> Option<Assessment> {
    let raw: RawAssessment = serde_json::from_value(value).ok()?;
    Some(normalize::assessment(raw, options))
}
