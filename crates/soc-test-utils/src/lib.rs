//! Testing utilities for the SOC assessment workspace
//!
//! An in-memory persistence service with failure injection, a scripted
//! plan generator, and framework fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use soc_hydrate::MigrationPayload;
use soc_model::{
    sort_actions, Action, ActionId, ActionPatch, AiSettings, Assessment, AssessmentId, Framework,
    FrameworkCatalog, NewAction, NewWorkspace, Workspace, WorkspaceId, WorkspacePatch,
};
use soc_store::{
    ActionPlanGenerator, AiError, AssessmentStore, ImportSummary, PlanPrompt, RemoteClient,
    RemoteError, RemoteErrorKind, StoreConfig, SuggestedAction,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;

/// Remote operations, for failure injection and call logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    ListWorkspaces,
    GetWorkspace,
    CreateWorkspace,
    UpdateWorkspace,
    DeleteWorkspace,
    ListAssessments,
    GetAssessment,
    CreateAssessment,
    UpdateAssessment,
    DeleteAssessment,
    ListActions,
    CreateAction,
    CreateActions,
    UpdateAction,
    DeleteAction,
    ImportLocal,
}

#[derive(Debug, Default)]
struct Server {
    workspaces: Vec<Workspace>,
    actions: Vec<Action>,
    next_id: u64,
    failures: HashMap<RemoteOp, RemoteErrorKind>,
    calls: Vec<RemoteOp>,
}

impl Server {
    fn mint(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn workspace_mut(&mut self, id: &WorkspaceId) -> Result<&mut Workspace, RemoteError> {
        self.workspaces
            .iter_mut()
            .find(|w| w.id == *id)
            .ok_or_else(|| RemoteError::not_found(format!("workspace {id}")))
    }

    fn owner_of(&self, assessment_id: &AssessmentId) -> Option<WorkspaceId> {
        self.workspaces
            .iter()
            .find(|w| w.contains(assessment_id))
            .map(|w| w.id.clone())
    }

    fn insert_action(&mut self, fields: NewAction) -> Result<Action, RemoteError> {
        let fields = fields
            .validate()
            .map_err(|e| RemoteError::new(RemoteErrorKind::Validation, e.to_string()))?;
        let workspace_id = fields
            .workspace_id
            .clone()
            .or_else(|| self.owner_of(&fields.assessment_id))
            .ok_or_else(|| RemoteError::not_found(format!("assessment {}", fields.assessment_id)))?;
        let mut action = fields.placeholder(workspace_id, Utc::now());
        action.id = ActionId::new(self.mint("act"));
        self.actions.push(action.clone());
        Ok(action)
    }
}

/// Persistence service held in memory
///
/// Server ids are minted as `ws-N`, `asm-N` and `act-N`. Client-generated
/// assessment ids are kept as sent.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    server: Mutex<Server>,
    holds: Mutex<HashMap<RemoteOp, Arc<Notify>>>,
}

impl InMemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a server-side workspace
    #[must_use]
    pub fn with_workspace(self, workspace: Workspace) -> Self {
        self.server.lock().workspaces.push(workspace);
        self
    }

    /// Reject the next call of `op` with `kind`
    pub fn fail_next(&self, op: RemoteOp, kind: RemoteErrorKind) {
        self.server.lock().failures.insert(op, kind);
    }

    /// Park the next call of `op` until the returned gate is notified
    ///
    /// The call is not logged or served before release, so tests can act
    /// while a remote write is in flight.
    pub fn hold_next(&self, op: RemoteOp) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.holds.lock().insert(op, gate.clone());
        gate
    }

    /// Every call made so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteOp> {
        self.server.lock().calls.clone()
    }

    #[must_use]
    pub fn call_count(&self, op: RemoteOp) -> usize {
        self.server.lock().calls.iter().filter(|c| **c == op).count()
    }

    /// Server-side workspaces
    #[must_use]
    pub fn workspaces(&self) -> Vec<Workspace> {
        self.server.lock().workspaces.clone()
    }

    /// Server-side actions
    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        self.server.lock().actions.clone()
    }

    async fn gate(&self, op: RemoteOp) {
        let held = self.holds.lock().remove(&op);
        if let Some(gate) = held {
            gate.notified().await;
        }
    }

    fn serve<T>(
        &self,
        op: RemoteOp,
        f: impl FnOnce(&mut Server) -> Result<T, RemoteError>,
    ) -> Result<T, RemoteError> {
        let mut server = self.server.lock();
        server.calls.push(op);
        if let Some(kind) = server.failures.remove(&op) {
            return Err(RemoteError::new(kind, format!("injected failure for {op:?}")));
        }
        f(&mut server)
    }
}

#[async_trait]
impl RemoteClient for InMemoryRemote {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, RemoteError> {
        self.gate(RemoteOp::ListWorkspaces).await;
        self.serve(RemoteOp::ListWorkspaces, |s| Ok(s.workspaces.clone()))
    }

    async fn get_workspace(&self, id: &WorkspaceId) -> Result<Workspace, RemoteError> {
        self.gate(RemoteOp::GetWorkspace).await;
        self.serve(RemoteOp::GetWorkspace, |s| s.workspace_mut(id).map(|w| w.clone()))
    }

    async fn create_workspace(&self, fields: NewWorkspace) -> Result<Workspace, RemoteError> {
        self.gate(RemoteOp::CreateWorkspace).await;
        self.serve(RemoteOp::CreateWorkspace, |s| {
            let id = WorkspaceId::new(s.mint("ws"));
            let workspace = Workspace::new(id, fields.name, Utc::now());
            s.workspaces.push(workspace.clone());
            Ok(workspace)
        })
    }

    async fn update_workspace(
        &self,
        id: &WorkspaceId,
        patch: WorkspacePatch,
    ) -> Result<Workspace, RemoteError> {
        self.gate(RemoteOp::UpdateWorkspace).await;
        self.serve(RemoteOp::UpdateWorkspace, |s| {
            let workspace = s.workspace_mut(id)?;
            if let Some(name) = patch.name {
                workspace.name = name;
            }
            workspace.updated_at = Utc::now();
            Ok(workspace.clone())
        })
    }

    async fn delete_workspace(&self, id: &WorkspaceId) -> Result<(), RemoteError> {
        self.gate(RemoteOp::DeleteWorkspace).await;
        self.serve(RemoteOp::DeleteWorkspace, |s| {
            let index = s
                .workspaces
                .iter()
                .position(|w| w.id == *id)
                .ok_or_else(|| RemoteError::not_found(format!("workspace {id}")))?;
            s.workspaces.remove(index);
            s.actions.retain(|a| a.workspace_id != *id);
            Ok(())
        })
    }

    async fn list_assessments(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Assessment>, RemoteError> {
        self.gate(RemoteOp::ListAssessments).await;
        self.serve(RemoteOp::ListAssessments, |s| {
            s.workspace_mut(workspace_id).map(|w| w.assessments.clone())
        })
    }

    async fn get_assessment(&self, id: &AssessmentId) -> Result<Assessment, RemoteError> {
        self.gate(RemoteOp::GetAssessment).await;
        self.serve(RemoteOp::GetAssessment, |s| {
            s.workspaces
                .iter()
                .find_map(|w| w.assessment(id))
                .cloned()
                .ok_or_else(|| RemoteError::not_found(format!("assessment {id}")))
        })
    }

    async fn create_assessment(
        &self,
        workspace_id: &WorkspaceId,
        mut assessment: Assessment,
    ) -> Result<Assessment, RemoteError> {
        self.gate(RemoteOp::CreateAssessment).await;
        self.serve(RemoteOp::CreateAssessment, |s| {
            if assessment.id.as_str().is_empty() || assessment.id.is_temporary() {
                assessment.id = AssessmentId::new(s.mint("asm"));
            }
            let workspace = s.workspace_mut(workspace_id)?;
            workspace.upsert_assessment(assessment.clone(), Utc::now());
            Ok(assessment)
        })
    }

    async fn update_assessment(
        &self,
        id: &AssessmentId,
        assessment: Assessment,
    ) -> Result<Assessment, RemoteError> {
        self.gate(RemoteOp::UpdateAssessment).await;
        self.serve(RemoteOp::UpdateAssessment, |s| {
            let owner = s
                .owner_of(id)
                .ok_or_else(|| RemoteError::not_found(format!("assessment {id}")))?;
            s.workspace_mut(&owner)?
                .upsert_assessment(assessment.clone(), Utc::now());
            Ok(assessment)
        })
    }

    async fn delete_assessment(&self, id: &AssessmentId) -> Result<(), RemoteError> {
        self.gate(RemoteOp::DeleteAssessment).await;
        self.serve(RemoteOp::DeleteAssessment, |s| {
            let owner = s
                .owner_of(id)
                .ok_or_else(|| RemoteError::not_found(format!("assessment {id}")))?;
            s.workspace_mut(&owner)?.remove_assessment(id, Utc::now());
            s.actions.retain(|a| a.assessment_id != *id);
            Ok(())
        })
    }

    async fn list_actions(&self, assessment_id: &AssessmentId) -> Result<Vec<Action>, RemoteError> {
        self.gate(RemoteOp::ListActions).await;
        self.serve(RemoteOp::ListActions, |s| {
            let mut actions: Vec<Action> = s
                .actions
                .iter()
                .filter(|a| a.assessment_id == *assessment_id)
                .cloned()
                .collect();
            sort_actions(&mut actions);
            Ok(actions)
        })
    }

    async fn create_action(&self, fields: NewAction) -> Result<Action, RemoteError> {
        self.gate(RemoteOp::CreateAction).await;
        self.serve(RemoteOp::CreateAction, |s| s.insert_action(fields))
    }

    async fn create_actions(
        &self,
        assessment_id: &AssessmentId,
        fields: Vec<NewAction>,
    ) -> Result<Vec<Action>, RemoteError> {
        self.gate(RemoteOp::CreateActions).await;
        self.serve(RemoteOp::CreateActions, |s| {
            fields
                .into_iter()
                .map(|mut f| {
                    f.assessment_id = assessment_id.clone();
                    s.insert_action(f)
                })
                .collect()
        })
    }

    async fn update_action(
        &self,
        id: &ActionId,
        patch: ActionPatch,
    ) -> Result<Action, RemoteError> {
        self.gate(RemoteOp::UpdateAction).await;
        self.serve(RemoteOp::UpdateAction, |s| {
            let action = s
                .actions
                .iter_mut()
                .find(|a| a.id == *id)
                .ok_or_else(|| RemoteError::not_found(format!("action {id}")))?;
            patch.apply_to(action, Utc::now());
            Ok(action.clone())
        })
    }

    async fn delete_action(&self, id: &ActionId) -> Result<(), RemoteError> {
        self.gate(RemoteOp::DeleteAction).await;
        self.serve(RemoteOp::DeleteAction, |s| {
            let before = s.actions.len();
            s.actions.retain(|a| a.id != *id);
            if s.actions.len() == before {
                return Err(RemoteError::not_found(format!("action {id}")));
            }
            Ok(())
        })
    }

    async fn import_local(&self, payload: MigrationPayload) -> Result<ImportSummary, RemoteError> {
        self.gate(RemoteOp::ImportLocal).await;
        self.serve(RemoteOp::ImportLocal, |s| {
            let summary = ImportSummary {
                workspaces: payload.workspaces.len(),
                assessments: payload.assessment_count(),
            };
            for workspace in payload.workspaces {
                s.workspaces.retain(|w| w.id != workspace.id);
                s.workspaces.push(workspace);
            }
            Ok(summary)
        })
    }
}

/// Scripted plan generator
#[derive(Debug, Default)]
pub struct StubAi {
    plan: Mutex<Option<Result<String, AiError>>>,
    actions: Mutex<Vec<SuggestedAction>>,
    prompts: Mutex<Vec<PlanPrompt>>,
}

impl StubAi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer plan requests with `text`
    #[must_use]
    pub fn with_plan(self, text: impl Into<String>) -> Self {
        *self.plan.lock() = Some(Ok(text.into()));
        self
    }

    /// Fail plan requests
    #[must_use]
    pub fn failing(self, error: AiError) -> Self {
        *self.plan.lock() = Some(Err(error));
        self
    }

    /// Answer action requests with these titles
    #[must_use]
    pub fn with_actions<I, S>(self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.actions.lock() = titles
            .into_iter()
            .map(|title| SuggestedAction {
                title: title.into(),
                description: String::new(),
                priority: soc_model::ActionPriority::Medium,
                category: None,
            })
            .collect();
        self
    }

    /// Prompts received so far
    #[must_use]
    pub fn prompts(&self) -> Vec<PlanPrompt> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ActionPlanGenerator for StubAi {
    async fn generate_plan(
        &self,
        _settings: &AiSettings,
        prompt: &PlanPrompt,
    ) -> Result<String, AiError> {
        self.prompts.lock().push(prompt.clone());
        self.plan.lock().clone().unwrap_or_else(|| Ok(String::new()))
    }

    async fn generate_actions(
        &self,
        _settings: &AiSettings,
        prompt: &PlanPrompt,
    ) -> Result<Vec<SuggestedAction>, AiError> {
        self.prompts.lock().push(prompt.clone());
        Ok(self.actions.lock().clone())
    }
}

/// Id of [`sample_framework`]
pub const SAMPLE_FRAMEWORK: &str = "sample";

/// Two domains: `D1` with aspects `A1` and `A2`, `D2` with `A3`
///
/// `A1` holds two five-option questions (`1.1`, `1.2`), `A2` one (`2.1`),
/// `A3` one (`3.1`) plus an unanswerable free-text item (`3.2`).
#[must_use]
pub fn sample_framework() -> Framework {
    let scale = r#"["None","Initial","Managed","Defined","Optimized"]"#;
    let tree = format!(
        r#"{{"tree":{{
            "D1":{{
                "A1":[{{"code":"1.1","text":"Charter","answer_options":{scale}}},
                      {{"code":"1.2","text":"Budget","answer_options":{scale}}}],
                "A2":[{{"code":"2.1","text":"Staffing","answer_options":{scale}}}]
            }},
            "D2":{{
                "A3":[{{"code":"3.1","text":"Tooling","answer_options":{scale}}},
                      {{"code":"3.2","text":"Notes","item_type":"text"}}]
            }}
        }}}}"#
    );
    Framework::from_tree_json(SAMPLE_FRAMEWORK, "Sample Framework", &tree).unwrap()
}

#[must_use]
pub fn sample_catalog() -> FrameworkCatalog {
    FrameworkCatalog::new().with(sample_framework())
}

/// Store configuration defaulting to the sample framework
#[must_use]
pub fn test_config() -> StoreConfig {
    StoreConfig::new().with_default_framework(SAMPLE_FRAMEWORK)
}

/// Store over an in-memory remote and a stub generator
#[must_use]
pub fn setup_store(remote: Arc<InMemoryRemote>, ai: Arc<StubAi>) -> AssessmentStore {
    AssessmentStore::new(test_config(), sample_catalog(), remote, ai)
}
