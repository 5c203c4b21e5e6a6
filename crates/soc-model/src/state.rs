//! Full application state held by the store

use crate::action::Action;
use crate::assessment::Assessment;
use crate::collection::dedupe_by_key;
use crate::ids::{AssessmentId, WorkspaceId};
use crate::metadata::Metadata;
use crate::workspace::Workspace;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Color scheme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

/// Credentials and endpoint for the generative-text service
///
/// The key lives in memory only and is never persisted.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AiSettings {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
}

impl std::fmt::Debug for AiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiSettings")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl AiSettings {
    /// Whether a key was provided
    #[inline]
    #[must_use]
    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Collapse/expand flags of the navigation sidebar
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiFlags {
    pub sidebar_collapsed: bool,
    pub sidebar_assessment_collapsed: bool,
    pub sidebar_administration_collapsed: bool,
    pub sidebar_domain_collapsed: BTreeMap<String, bool>,
}

/// The single source of truth consumed by every view
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub workspaces: Vec<Workspace>,
    pub current_workspace_id: Option<WorkspaceId>,
    /// Assessment loaded into the editing surface; may be an unsaved draft
    pub current_assessment: Assessment,
    /// Template applied to the next new draft
    pub upcoming_metadata: Metadata,
    /// Selected aspect; `None` selects the first aspect of the context
    pub active_aspect_key: Option<String>,
    pub ui: UiFlags,
    pub theme: Theme,
    pub ai: AiSettings,
    pub last_saved_at: Option<DateTime<Utc>>,
    /// Suppresses exactly one auto-save pass
    pub skip_next_auto_save: bool,
    pub actions_by_assessment_id: BTreeMap<AssessmentId, Vec<Action>>,
    /// Assessments whose first remote write has not settled; never persisted
    pub pending_creates: BTreeSet<AssessmentId>,
}

impl AppState {
    /// Fresh state: one local workspace and an empty draft
    #[must_use]
    pub fn fresh(
        default_framework_id: &str,
        default_workspace_name: &str,
        ai: AiSettings,
        now: DateTime<Utc>,
    ) -> Self {
        let workspace = Workspace::new(WorkspaceId::generate(), default_workspace_name, now);
        Self {
            current_workspace_id: Some(workspace.id.clone()),
            workspaces: vec![workspace],
            current_assessment: Assessment::draft(default_framework_id, Metadata::default()),
            upcoming_metadata: Metadata::default(),
            active_aspect_key: None,
            ui: UiFlags::default(),
            theme: Theme::default(),
            ai,
            last_saved_at: None,
            skip_next_auto_save: false,
            actions_by_assessment_id: BTreeMap::new(),
            pending_creates: BTreeSet::new(),
        }
    }

    /// Position of a workspace
    #[must_use]
    pub fn workspace_position(&self, id: &WorkspaceId) -> Option<usize> {
        self.workspaces.iter().position(|w| &w.id == id)
    }

    /// Look up a workspace
    #[must_use]
    pub fn workspace(&self, id: &WorkspaceId) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| &w.id == id)
    }

    /// Look up a workspace mutably
    pub fn workspace_mut(&mut self, id: &WorkspaceId) -> Option<&mut Workspace> {
        self.workspaces.iter_mut().find(|w| &w.id == id)
    }

    /// Workspace the current pointer resolves to
    #[must_use]
    pub fn current_workspace(&self) -> Option<&Workspace> {
        self.current_workspace_id
            .as_ref()
            .and_then(|id| self.workspace(id))
    }

    /// Workspace the current pointer resolves to, mutably
    pub fn current_workspace_mut(&mut self) -> Option<&mut Workspace> {
        let id = self.current_workspace_id.clone()?;
        self.workspace_mut(&id)
    }

    /// Workspace whose collection holds the assessment
    #[must_use]
    pub fn workspace_of(&self, assessment_id: &AssessmentId) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.contains(assessment_id))
    }

    /// Whether the current assessment already exists in the current workspace
    #[must_use]
    pub fn current_is_persisted(&self) -> bool {
        self.current_workspace()
            .is_some_and(|w| w.contains(&self.current_assessment.id))
    }

    /// Point at a workspace and load its most recent assessment (or a fresh draft)
    pub fn enter_workspace(&mut self, id: Option<WorkspaceId>, default_framework_id: &str) {
        let next = id
            .as_ref()
            .and_then(|id| self.workspace(id))
            .and_then(Workspace::most_recent_assessment)
            .cloned();
        self.current_assessment = next.unwrap_or_else(|| self.new_draft(default_framework_id));
        self.current_workspace_id = id;
        self.active_aspect_key = None;
    }

    /// Draft built from the upcoming-metadata template
    #[must_use]
    pub fn new_draft(&self, framework_id: &str) -> Assessment {
        Assessment::draft(framework_id, self.upcoming_metadata.clone())
    }

    /// Prune duplicate ids from every collection, keeping first occurrences
    ///
    /// Returns how many entries were dropped.
    pub fn reconcile(&mut self) -> usize {
        let mut pruned = dedupe_by_key(&mut self.workspaces, |w| w.id.clone());
        for workspace in &mut self.workspaces {
            pruned += workspace.dedupe_assessments();
        }
        for bucket in self.actions_by_assessment_id.values_mut() {
            pruned += dedupe_by_key(bucket, |a| a.id.clone());
        }
        if pruned > 0 {
            tracing::debug!(pruned, "dropped stale duplicates during reconciliation");
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn state() -> AppState {
        AppState::fresh("soc_cmm", "Default Workspace", AiSettings::default(), now())
    }

    #[test]
    fn fresh_state_points_at_its_workspace() {
        let s = state();
        assert_eq!(s.workspaces.len(), 1);
        assert_eq!(s.current_workspace().unwrap().name, "Default Workspace");
        assert!(!s.current_is_persisted());
        assert!(s.current_assessment.saved_at.is_none());
    }

    #[test]
    fn reconcile_drops_duplicates_everywhere() {
        let mut s = state();
        let ws = s.workspaces[0].clone();
        s.workspaces.push(ws);
        let a = s.current_assessment.clone();
        s.workspaces[0].assessments.push(a.clone());
        s.workspaces[0].assessments.push(a);

        assert_eq!(s.reconcile(), 2);
        assert_eq!(s.workspaces.len(), 1);
        assert_eq!(s.workspaces[0].assessments.len(), 1);
        assert_eq!(s.reconcile(), 0);
    }

    #[test]
    fn entering_workspace_resets_navigation() {
        let mut s = state();
        s.active_aspect_key = Some("D::A".into());
        let mut saved = s.current_assessment.clone();
        saved.saved_at = Some(now());
        s.workspaces[0].assessments.push(saved.clone());
        s.current_assessment = Assessment::draft("soc_cmm", Metadata::default());

        let id = s.current_workspace_id.clone();
        s.enter_workspace(id, "soc_cmm");
        assert_eq!(s.current_assessment.id, saved.id);
        assert_eq!(s.active_aspect_key, None);
    }

    #[test]
    fn ai_key_is_redacted_in_debug() {
        let ai = AiSettings {
            api_key: "xai-secret".into(),
            ..AiSettings::default()
        };
        assert!(!format!("{ai:?}").contains("secret"));
    }
}
