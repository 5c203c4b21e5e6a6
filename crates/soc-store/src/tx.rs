//! Optimistic mutation transactions
//!
//! Every remote-backed mutation applies locally first and carries an owned
//! snapshot of what it displaced. The snapshot is a value, never a reference
//! into live state, so rolling back after later edits cannot alias them.
//!
//! ```text
//! Applied ──confirm──▶ Confirmed
//!    │
//!    └──roll_back──▶ RolledBack
//! ```

use chrono::{DateTime, Utc};
use soc_model::{
    Action, ActionId, AppState, Assessment, AssessmentId, Workspace, WorkspaceId,
};

/// Lifecycle of one optimistic mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// Local change visible, remote outcome unknown
    Applied,
    /// Remote accepted the change
    Confirmed,
    /// Remote rejected the change and the snapshot was restored
    RolledBack,
}

/// Reverses one optimistic change
pub trait Undo {
    /// Put the displaced values back
    fn undo(self, state: &mut AppState);
}

/// A mutation in the `Applied` state
#[derive(Debug)]
#[must_use = "an applied mutation must be confirmed or rolled back"]
pub struct Transaction<U: Undo> {
    label: &'static str,
    undo: U,
}

impl<U: Undo> Transaction<U> {
    pub(crate) fn applied(label: &'static str, undo: U) -> Self {
        Self { label, undo }
    }

    /// Operation name for logs
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Current lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> TxState {
        TxState::Applied
    }

    /// Snapshot held for rollback
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &U {
        &self.undo
    }

    /// Drop the snapshot; the local change stands
    pub(crate) fn confirm(self) -> TxState {
        tracing::debug!(op = self.label, "optimistic change confirmed");
        TxState::Confirmed
    }

    /// Restore the snapshot
    pub(crate) fn roll_back(self, state: &mut AppState) -> TxState {
        tracing::warn!(op = self.label, "rolling back optimistic change");
        self.undo.undo(state);
        TxState::RolledBack
    }
}

/// Navigation pointers captured before a mutation may move them
#[derive(Debug, Clone, PartialEq)]
pub struct Pointers {
    /// Current workspace
    pub workspace: Option<WorkspaceId>,
    /// Current assessment body
    pub assessment: Assessment,
    /// Selected aspect
    pub active_aspect_key: Option<String>,
    /// Pending auto-save suppression
    pub skip_next_auto_save: bool,
}

impl Pointers {
    /// Capture from live state
    #[must_use]
    pub fn capture(state: &AppState) -> Self {
        Self {
            workspace: state.current_workspace_id.clone(),
            assessment: state.current_assessment.clone(),
            active_aspect_key: state.active_aspect_key.clone(),
            skip_next_auto_save: state.skip_next_auto_save,
        }
    }

    /// Write back into live state
    pub fn restore(self, state: &mut AppState) {
        state.current_workspace_id = self.workspace;
        state.current_assessment = self.assessment;
        state.active_aspect_key = self.active_aspect_key;
        state.skip_next_auto_save = self.skip_next_auto_save;
    }
}

/// Temporary workspace appended and made current
#[derive(Debug, Clone)]
pub struct WorkspaceInsert {
    /// Temporary id
    pub temp_id: WorkspaceId,
    /// Pointers before the switch
    pub prior: Pointers,
}

impl Undo for WorkspaceInsert {
    fn undo(self, state: &mut AppState) {
        state.workspaces.retain(|w| w.id != self.temp_id);
        if state.current_workspace_id.as_ref() == Some(&self.temp_id) {
            self.prior.restore(state);
        }
    }
}

/// Workspace removed from the list
#[derive(Debug, Clone)]
pub struct WorkspaceRemoval {
    /// Former position
    pub index: usize,
    /// Removed workspace
    pub workspace: Workspace,
    /// Pointers before removal, restored only if the removal moved them
    pub prior: Option<Pointers>,
    /// Workspace the pointer moved to
    pub moved_to: Option<WorkspaceId>,
}

impl Undo for WorkspaceRemoval {
    fn undo(self, state: &mut AppState) {
        if state.workspace(&self.workspace.id).is_none() {
            soc_model::insert_clamped(&mut state.workspaces, self.index, self.workspace);
        }
        if let Some(prior) = self.prior {
            if state.current_workspace_id == self.moved_to {
                prior.restore(state);
            }
        }
    }
}

/// Assessment appended to a workspace collection by its first save
#[derive(Debug, Clone)]
pub struct AssessmentInsert {
    /// Owning workspace
    pub workspace_id: WorkspaceId,
    /// Inserted id
    pub id: AssessmentId,
    /// Workspace timestamp before the insert
    pub prior_updated_at: DateTime<Utc>,
    /// Save stamp written by the insert
    pub saved_at: DateTime<Utc>,
    /// Save stamp of the current assessment before the insert
    pub prior_saved_at: Option<DateTime<Utc>>,
    /// State-wide last save before the insert
    pub prior_last_saved_at: Option<DateTime<Utc>>,
}

impl Undo for AssessmentInsert {
    fn undo(self, state: &mut AppState) {
        state.pending_creates.remove(&self.id);
        if let Some(ws) = state.workspace_mut(&self.workspace_id) {
            ws.assessments.retain(|a| a.id != self.id);
            ws.updated_at = self.prior_updated_at;
        }
        let current = &mut state.current_assessment;
        if current.id == self.id && current.saved_at == Some(self.saved_at) {
            current.saved_at = self.prior_saved_at;
        }
        if state.last_saved_at == Some(self.saved_at) {
            state.last_saved_at = self.prior_last_saved_at;
        }
    }
}

/// Assessment removed from a workspace collection
#[derive(Debug, Clone)]
pub struct AssessmentRemoval {
    /// Owning workspace
    pub workspace_id: WorkspaceId,
    /// Former position
    pub index: usize,
    /// Removed assessment
    pub assessment: Assessment,
    /// Workspace timestamp before the removal
    pub prior_updated_at: DateTime<Utc>,
    /// Pointers before removal, restored only if the removal moved them
    pub prior: Option<Pointers>,
    /// Draft loaded in place of the removed assessment
    pub replaced_by: Option<AssessmentId>,
}

impl Undo for AssessmentRemoval {
    fn undo(self, state: &mut AppState) {
        if let Some(ws) = state.workspace_mut(&self.workspace_id) {
            if !ws.contains(&self.assessment.id) {
                ws.restore_assessment(self.index, self.assessment);
                ws.updated_at = self.prior_updated_at;
            }
        }
        if let Some(prior) = self.prior {
            if self.replaced_by.as_ref() == Some(&state.current_assessment.id) {
                prior.restore(state);
            }
        }
    }
}

/// Placeholder actions added to a bucket
#[derive(Debug, Clone)]
pub struct ActionInserts {
    /// Bucket key
    pub assessment_id: AssessmentId,
    /// Temporary ids
    pub temp_ids: Vec<ActionId>,
}

impl Undo for ActionInserts {
    fn undo(self, state: &mut AppState) {
        if let Some(bucket) = state.actions_by_assessment_id.get_mut(&self.assessment_id) {
            bucket.retain(|a| !self.temp_ids.contains(&a.id));
        }
    }
}

/// Action removed from a bucket
#[derive(Debug, Clone)]
pub struct ActionRemoval {
    /// Bucket key
    pub assessment_id: AssessmentId,
    /// Former position
    pub index: usize,
    /// Removed action
    pub action: Action,
}

impl Undo for ActionRemoval {
    fn undo(self, state: &mut AppState) {
        let bucket = state
            .actions_by_assessment_id
            .entry(self.assessment_id)
            .or_default();
        if !bucket.iter().any(|a| a.id == self.action.id) {
            soc_model::insert_clamped(bucket, self.index, self.action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use soc_model::{AiSettings, Metadata, NewAction};

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn state() -> AppState {
        AppState::fresh("soc_cmm", "Default Workspace", AiSettings::default(), now())
    }

    #[test]
    fn workspace_insert_rollback_restores_pointer() {
        let mut s = state();
        let prior = Pointers::capture(&s);
        let temp = WorkspaceId::temporary();
        s.workspaces.push(Workspace::new(temp.clone(), "New", now()));
        s.enter_workspace(Some(temp.clone()), "soc_cmm");

        let undo = WorkspaceInsert {
            temp_id: temp,
            prior: prior.clone(),
        };
        let tx = Transaction::applied("create_workspace", undo);
        assert_eq!(tx.state(), TxState::Applied);
        assert_eq!(tx.roll_back(&mut s), TxState::RolledBack);

        assert_eq!(s.workspaces.len(), 1);
        assert_eq!(Pointers::capture(&s), prior);
    }

    #[test]
    fn workspace_insert_rollback_leaves_foreign_pointer() {
        let mut s = state();
        let prior = Pointers::capture(&s);
        let temp = WorkspaceId::temporary();
        s.workspaces.push(Workspace::new(temp.clone(), "New", now()));
        let other = Workspace::new(WorkspaceId::new("other"), "Other", now());
        s.workspaces.push(other);
        s.current_workspace_id = Some(WorkspaceId::new("other"));

        WorkspaceInsert { temp_id: temp, prior }.undo(&mut s);
        assert_eq!(s.current_workspace_id.unwrap().as_str(), "other");
    }

    #[test]
    fn assessment_removal_restores_index() {
        let mut s = state();
        let ws_id = s.workspaces[0].id.clone();
        let updated_at = s.workspaces[0].updated_at;
        for i in 0..5 {
            let mut a = Assessment::draft("soc_cmm", Metadata::default());
            a.id = AssessmentId::new(format!("a{i}"));
            s.workspaces[0].assessments.push(a);
        }
        let (index, removed) = s.workspaces[0]
            .remove_assessment(&AssessmentId::new("a2"), now() + chrono::Duration::hours(1))
            .unwrap();

        AssessmentRemoval {
            workspace_id: ws_id,
            index,
            assessment: removed,
            prior_updated_at: updated_at,
            prior: None,
            replaced_by: None,
        }
        .undo(&mut s);

        assert_eq!(s.workspaces[0].assessments[2].id.as_str(), "a2");
        assert_eq!(s.workspaces[0].assessments.len(), 5);
        assert_eq!(s.workspaces[0].updated_at, updated_at);
    }

    #[test]
    fn assessment_insert_rollback_restores_save_stamps() {
        let mut s = state();
        let ws_id = s.workspaces[0].id.clone();
        let updated_at = s.workspaces[0].updated_at;
        let saved_at = now() + chrono::Duration::minutes(5);
        let id = s.current_assessment.id.clone();

        s.current_assessment.saved_at = Some(saved_at);
        s.last_saved_at = Some(saved_at);
        s.pending_creates.insert(id.clone());
        let copy = s.current_assessment.clone();
        s.workspaces[0].upsert_assessment(copy, saved_at);

        AssessmentInsert {
            workspace_id: ws_id,
            id,
            prior_updated_at: updated_at,
            saved_at,
            prior_saved_at: None,
            prior_last_saved_at: None,
        }
        .undo(&mut s);

        assert!(s.workspaces[0].assessments.is_empty());
        assert_eq!(s.workspaces[0].updated_at, updated_at);
        assert_eq!(s.current_assessment.saved_at, None);
        assert_eq!(s.last_saved_at, None);
        assert!(s.pending_creates.is_empty());
    }

    #[test]
    fn action_rollbacks() {
        let mut s = state();
        let a_id = AssessmentId::new("a1");
        let placeholder = NewAction::new(a_id.clone(), "Tune")
            .placeholder(WorkspaceId::new("w"), now());
        let temp = placeholder.id.clone();
        s.actions_by_assessment_id.entry(a_id.clone()).or_default().push(placeholder.clone());

        ActionInserts { assessment_id: a_id.clone(), temp_ids: vec![temp] }.undo(&mut s);
        assert!(s.actions_by_assessment_id[&a_id].is_empty());

        ActionRemoval { assessment_id: a_id.clone(), index: 4, action: placeholder }.undo(&mut s);
        assert_eq!(s.actions_by_assessment_id[&a_id].len(), 1);
    }
}
