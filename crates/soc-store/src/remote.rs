//! Remote persistence boundary
//!
//! The store never talks to the network itself. Every remote effect goes
//! through a [`RemoteClient`] injected at construction, which rejects with a
//! [`RemoteError`] carrying a distinguishable kind.

use crate::error::RemoteError;
use serde::{Deserialize, Serialize};
use soc_hydrate::MigrationPayload;
use soc_model::{
    Action, ActionId, ActionPatch, Assessment, AssessmentId, NewAction, NewWorkspace, Workspace,
    WorkspaceId, WorkspacePatch,
};

/// Counts reported by the bulk local-data import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Workspaces written
    pub workspaces: usize,
    /// Assessments written
    pub assessments: usize,
}

/// CRUD per entity type against the persistence service
///
/// Workspaces returned by [`RemoteClient::list_workspaces`] already carry
/// their nested assessments. Timeouts are the implementor's concern.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteClient: Send + Sync {
    /// All workspaces with nested assessments
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, RemoteError>;

    /// One workspace
    async fn get_workspace(&self, id: &WorkspaceId) -> Result<Workspace, RemoteError>;

    /// Create a workspace; the server assigns the id
    async fn create_workspace(&self, fields: NewWorkspace) -> Result<Workspace, RemoteError>;

    /// Patch a workspace
    async fn update_workspace(
        &self,
        id: &WorkspaceId,
        patch: WorkspacePatch,
    ) -> Result<Workspace, RemoteError>;

    /// Delete a workspace and everything it owns
    async fn delete_workspace(&self, id: &WorkspaceId) -> Result<(), RemoteError>;

    /// Assessments of one workspace
    async fn list_assessments(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Assessment>, RemoteError>;

    /// One assessment
    async fn get_assessment(&self, id: &AssessmentId) -> Result<Assessment, RemoteError>;

    /// Create an assessment under a workspace
    async fn create_assessment(
        &self,
        workspace_id: &WorkspaceId,
        assessment: Assessment,
    ) -> Result<Assessment, RemoteError>;

    /// Replace an assessment body
    async fn update_assessment(
        &self,
        id: &AssessmentId,
        assessment: Assessment,
    ) -> Result<Assessment, RemoteError>;

    /// Delete an assessment and its actions
    async fn delete_assessment(&self, id: &AssessmentId) -> Result<(), RemoteError>;

    /// Actions of one assessment, in serving order
    async fn list_actions(&self, assessment_id: &AssessmentId) -> Result<Vec<Action>, RemoteError>;

    /// Create one action
    async fn create_action(&self, fields: NewAction) -> Result<Action, RemoteError>;

    /// Create several actions for one assessment in a single request
    async fn create_actions(
        &self,
        assessment_id: &AssessmentId,
        fields: Vec<NewAction>,
    ) -> Result<Vec<Action>, RemoteError>;

    /// Patch an action
    async fn update_action(&self, id: &ActionId, patch: ActionPatch) -> Result<Action, RemoteError>;

    /// Delete an action
    async fn delete_action(&self, id: &ActionId) -> Result<(), RemoteError>;

    /// One-shot import of locally held workspaces
    async fn import_local(&self, payload: MigrationPayload) -> Result<ImportSummary, RemoteError>;
}
