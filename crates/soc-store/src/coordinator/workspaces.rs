//! Workspace fetch, create, rename and delete

use crate::error::StoreError;
use crate::store::AssessmentStore;
use crate::tx::{Pointers, Transaction, TxState, WorkspaceInsert, WorkspaceRemoval};
use chrono::Utc;
use soc_model::{NewWorkspace, Workspace, WorkspaceId, WorkspacePatch};

/// Workspace create between its local and remote phases
#[derive(Debug)]
#[must_use = "settle the pending create to confirm or roll it back"]
pub struct PendingWorkspaceCreate {
    temp_id: WorkspaceId,
    fields: NewWorkspace,
    tx: Transaction<WorkspaceInsert>,
}

impl PendingWorkspaceCreate {
    /// Id of the optimistic placeholder
    #[must_use]
    pub fn temp_id(&self) -> &WorkspaceId {
        &self.temp_id
    }

    /// Always [`TxState::Applied`] until settled
    #[must_use]
    pub fn state(&self) -> TxState {
        self.tx.state()
    }
}

/// Workspace delete between its local and remote phases
#[derive(Debug)]
#[must_use = "settle the pending delete to confirm or roll it back"]
pub struct PendingWorkspaceDelete {
    id: WorkspaceId,
    tx: Transaction<WorkspaceRemoval>,
}

impl PendingWorkspaceDelete {
    /// Id being deleted
    #[must_use]
    pub fn id(&self) -> &WorkspaceId {
        &self.id
    }

    /// Position the workspace held before removal
    #[must_use]
    pub fn index(&self) -> usize {
        self.tx.snapshot().index
    }
}

fn validated_name(name: &str) -> Result<String, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::validation("workspace name is required"));
    }
    Ok(name.to_string())
}

fn reject_temporary(id: &WorkspaceId) -> Result<(), StoreError> {
    if id.is_temporary() {
        return Err(StoreError::validation("workspace is still being created"));
    }
    Ok(())
}

impl AssessmentStore {
    /// Replace local workspaces with the remote list
    ///
    /// The current pointer survives when it still resolves; otherwise the
    /// first workspace is entered.
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`] when listing fails; local state is untouched.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_workspaces(&self) -> Result<Vec<Workspace>, StoreError> {
        let fetched = self.remote().list_workspaces().await.map_err(|error| {
            tracing::warn!(%error, "workspace list failed");
            error
        })?;
        let default_framework = self.config().default_framework_id.clone();

        let (workspaces, moved) = self.write(|s| {
            s.workspaces = fetched;
            s.reconcile();
            let moved = s.current_workspace().is_none();
            if moved {
                let first = s.workspaces.first().map(|w| w.id.clone());
                s.enter_workspace(first, &default_framework);
                s.skip_next_auto_save = true;
            }
            (s.workspaces.clone(), moved)
        });
        if moved {
            self.announce_load();
        }
        tracing::info!(count = workspaces.len(), "workspaces fetched");
        Ok(workspaces)
    }

    /// Create a workspace and make it current
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] for a blank name (nothing applied);
    /// [`StoreError::Remote`] after the placeholder was rolled back.
    pub async fn create_workspace(&self, name: &str) -> Result<Workspace, StoreError> {
        let pending = self.begin_create_workspace(name)?;
        self.settle_create_workspace(pending).await
    }

    /// Insert a placeholder workspace and switch to it
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] for a blank name.
    pub fn begin_create_workspace(&self, name: &str) -> Result<PendingWorkspaceCreate, StoreError> {
        let name = validated_name(name)?;
        let temp_id = WorkspaceId::temporary();
        let default_framework = self.config().default_framework_id.clone();

        let prior = self.write(|s| {
            let prior = Pointers::capture(s);
            s.workspaces
                .push(Workspace::new(temp_id.clone(), name.clone(), Utc::now()));
            s.enter_workspace(Some(temp_id.clone()), &default_framework);
            prior
        });

        Ok(PendingWorkspaceCreate {
            tx: Transaction::applied(
                "create_workspace",
                WorkspaceInsert {
                    temp_id: temp_id.clone(),
                    prior,
                },
            ),
            temp_id,
            fields: NewWorkspace { name },
        })
    }

    /// Call the remote and confirm or roll back
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`] after rollback.
    #[tracing::instrument(skip_all, fields(temp = %pending.temp_id))]
    pub async fn settle_create_workspace(
        &self,
        pending: PendingWorkspaceCreate,
    ) -> Result<Workspace, StoreError> {
        let PendingWorkspaceCreate {
            temp_id,
            fields,
            tx,
        } = pending;

        match self.remote().create_workspace(fields).await {
            Ok(created) => {
                self.write(|s| {
                    match s.workspace_position(&temp_id) {
                        Some(index) => {
                            let local =
                                std::mem::replace(&mut s.workspaces[index], created.clone());
                            let confirmed = &mut s.workspaces[index];
                            for assessment in local.assessments {
                                if !confirmed.contains(&assessment.id) {
                                    confirmed.assessments.push(assessment);
                                }
                            }
                        }
                        None if s.workspace(&created.id).is_none() => {
                            s.workspaces.push(created.clone());
                        }
                        None => {}
                    }
                    if s.current_workspace_id.as_ref() == Some(&temp_id) {
                        s.current_workspace_id = Some(created.id.clone());
                    }
                });
                tx.confirm();
                tracing::info!(workspace = %created.id, "workspace created");
                Ok(created)
            }
            Err(error) => {
                self.write(|s| tx.roll_back(s));
                tracing::warn!(%error, "workspace create rejected");
                Err(error.into())
            }
        }
    }

    /// Rename a workspace
    ///
    /// Applied locally first; a remote rejection is surfaced and the local
    /// name is kept. Returns `Ok(None)` when the id does not resolve.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] for a blank name or a placeholder id;
    /// [`StoreError::Remote`] when the update is rejected.
    #[tracing::instrument(skip(self))]
    pub async fn rename_workspace(
        &self,
        id: &WorkspaceId,
        name: &str,
    ) -> Result<Option<Workspace>, StoreError> {
        let name = validated_name(name)?;
        reject_temporary(id)?;

        let applied = self.write(|s| {
            let workspace = s.workspace_mut(id)?;
            workspace.name.clone_from(&name);
            workspace.updated_at = Utc::now();
            Some(())
        });
        if applied.is_none() {
            tracing::debug!("rename ignored, workspace not found");
            return Ok(None);
        }

        let patch = WorkspacePatch { name: Some(name) };
        match self.remote().update_workspace(id, patch).await {
            Ok(updated) => Ok(self.write(|s| {
                let workspace = s.workspace_mut(id)?;
                workspace.name = updated.name;
                workspace.updated_at = updated.updated_at;
                Some(workspace.clone())
            })),
            Err(error) => {
                tracing::warn!(%error, "workspace rename rejected, local name kept");
                Err(error.into())
            }
        }
    }

    /// Delete a workspace; `Ok(false)` when the id does not resolve
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] for a placeholder id;
    /// [`StoreError::Remote`] after the workspace was restored.
    pub async fn delete_workspace(&self, id: &WorkspaceId) -> Result<bool, StoreError> {
        match self.begin_delete_workspace(id)? {
            Some(pending) => self.settle_delete_workspace(pending).await.map(|()| true),
            None => Ok(false),
        }
    }

    /// Remove a workspace locally
    ///
    /// When it was current, the pointer moves to the first remaining
    /// workspace (or none) and the next auto-save is suppressed.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] for a placeholder id.
    pub fn begin_delete_workspace(
        &self,
        id: &WorkspaceId,
    ) -> Result<Option<PendingWorkspaceDelete>, StoreError> {
        reject_temporary(id)?;
        let default_framework = self.config().default_framework_id.clone();

        let removal = self.write(|s| {
            let index = s.workspace_position(id)?;
            let was_current = s.current_workspace_id.as_ref() == Some(id);
            let prior = was_current.then(|| Pointers::capture(s));
            let workspace = s.workspaces.remove(index);

            let mut moved_to = None;
            if was_current {
                moved_to = s.workspaces.first().map(|w| w.id.clone());
                s.enter_workspace(moved_to.clone(), &default_framework);
                s.skip_next_auto_save = true;
            }
            Some(WorkspaceRemoval {
                index,
                workspace,
                prior,
                moved_to,
            })
        });

        match &removal {
            None => tracing::debug!(workspace = %id, "delete ignored, workspace not found"),
            Some(undo) if undo.prior.is_some() => self.announce_load(),
            Some(_) => {}
        }
        Ok(removal.map(|undo| PendingWorkspaceDelete {
            id: id.clone(),
            tx: Transaction::applied("delete_workspace", undo),
        }))
    }

    /// Call the remote and confirm or restore
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`] after the workspace was re-inserted at its
    /// former index.
    #[tracing::instrument(skip_all, fields(workspace = %pending.id))]
    pub async fn settle_delete_workspace(
        &self,
        pending: PendingWorkspaceDelete,
    ) -> Result<(), StoreError> {
        let PendingWorkspaceDelete { id, tx } = pending;
        match self.remote().delete_workspace(&id).await {
            Ok(()) => {
                let owned: Vec<_> = tx
                    .snapshot()
                    .workspace
                    .assessments
                    .iter()
                    .map(|a| a.id.clone())
                    .collect();
                self.write(|s| {
                    for assessment_id in &owned {
                        s.actions_by_assessment_id.remove(assessment_id);
                    }
                });
                tx.confirm();
                tracing::info!("workspace deleted");
                Ok(())
            }
            Err(error) => {
                self.write(|s| tx.roll_back(s));
                tracing::warn!(%error, "workspace delete rejected");
                Err(error.into())
            }
        }
    }
}
