//! Saving, fetching and deleting assessments

use crate::error::StoreError;
use crate::store::AssessmentStore;
use crate::tx::{AssessmentInsert, AssessmentRemoval, Pointers, Transaction};
use chrono::{DateTime, Utc};
use soc_model::{is_worth_persisting, Assessment, AssessmentId, WorkspaceId};

/// Who asked for the save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Debounced background save; honors the skip flag and the content gate
    Auto,
    /// User-requested save; always writes when there is a target
    Explicit,
}

/// Why a save wrote nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The one-shot suppression flag was consumed
    SuppressedOnce,
    /// No workspace to save into
    NoWorkspace,
    /// Target workspace is still being created
    PendingWorkspace,
    /// First write of this assessment has not settled
    PendingCreate,
    /// New draft without user content
    NothingToPersist,
}

/// Result of a save pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing written
    Skipped(SkipReason),
    /// First write; carries the confirmed id
    Created(AssessmentId),
    /// Existing record replaced
    Updated(AssessmentId),
}

impl SaveOutcome {
    /// Whether anything reached the remote
    #[must_use]
    pub fn wrote(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

/// Assessment delete between its local and remote phases
#[derive(Debug)]
#[must_use = "settle the pending delete to confirm or roll it back"]
pub struct PendingAssessmentDelete {
    id: AssessmentId,
    tx: Transaction<AssessmentRemoval>,
}

impl PendingAssessmentDelete {
    /// Id being deleted
    #[must_use]
    pub fn id(&self) -> &AssessmentId {
        &self.id
    }

    /// Position the assessment held before removal
    #[must_use]
    pub fn index(&self) -> usize {
        self.tx.snapshot().index
    }
}

enum SavePlan {
    Skip(SkipReason),
    Create {
        workspace_id: WorkspaceId,
        assessment: Assessment,
        tx: Transaction<AssessmentInsert>,
    },
    Update {
        assessment: Assessment,
    },
}

impl AssessmentStore {
    /// Background save of the current assessment
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`] when the write is rejected.
    pub async fn auto_save(&self) -> Result<SaveOutcome, StoreError> {
        self.persist_current(SaveMode::Auto).await
    }

    /// Explicit save of the current assessment, bypassing the content gate
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`] when the write is rejected.
    pub async fn save_current(&self) -> Result<SaveOutcome, StoreError> {
        self.persist_current(SaveMode::Explicit).await
    }

    /// Write the current assessment into its workspace and the remote
    ///
    /// A first write is optimistic and rolled back on rejection. While it is
    /// in flight, further saves of the same assessment are skipped. A
    /// rejected update keeps the local copy and is surfaced.
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`] when the write is rejected.
    #[tracing::instrument(skip(self))]
    pub async fn persist_current(&self, mode: SaveMode) -> Result<SaveOutcome, StoreError> {
        let now = Utc::now();
        let plan = self.write(|s| {
            if mode == SaveMode::Auto && std::mem::take(&mut s.skip_next_auto_save) {
                return SavePlan::Skip(SkipReason::SuppressedOnce);
            }
            let Some(workspace_id) = s.current_workspace_id.clone() else {
                return SavePlan::Skip(SkipReason::NoWorkspace);
            };
            if workspace_id.is_temporary() {
                return SavePlan::Skip(SkipReason::PendingWorkspace);
            }
            if s.pending_creates.contains(&s.current_assessment.id) {
                return SavePlan::Skip(SkipReason::PendingCreate);
            }
            let Some(persisted) = s
                .workspace(&workspace_id)
                .map(|w| w.contains(&s.current_assessment.id))
            else {
                return SavePlan::Skip(SkipReason::NoWorkspace);
            };
            if mode == SaveMode::Auto && !is_worth_persisting(&s.current_assessment, persisted) {
                return SavePlan::Skip(SkipReason::NothingToPersist);
            }

            let prior_saved_at = s.current_assessment.saved_at.replace(now);
            let prior_last_saved_at = s.last_saved_at.replace(now);
            let assessment = s.current_assessment.clone();
            let Some(workspace) = s.workspace_mut(&workspace_id) else {
                return SavePlan::Skip(SkipReason::NoWorkspace);
            };
            let prior_updated_at = workspace.updated_at;
            workspace.upsert_assessment(assessment.clone(), now);

            if persisted {
                return SavePlan::Update { assessment };
            }
            s.pending_creates.insert(assessment.id.clone());
            SavePlan::Create {
                tx: Transaction::applied(
                    "create_assessment",
                    AssessmentInsert {
                        workspace_id: workspace_id.clone(),
                        id: assessment.id.clone(),
                        prior_updated_at,
                        saved_at: now,
                        prior_saved_at,
                        prior_last_saved_at,
                    },
                ),
                workspace_id,
                assessment,
            }
        });

        match plan {
            SavePlan::Skip(reason) => {
                tracing::debug!(?reason, "save skipped");
                Ok(SaveOutcome::Skipped(reason))
            }
            SavePlan::Create {
                workspace_id,
                assessment,
                tx,
            } => self.confirm_created(&workspace_id, assessment, tx).await,
            SavePlan::Update { assessment } => {
                let id = assessment.id.clone();
                match self.remote().update_assessment(&id, assessment).await {
                    Ok(saved) => {
                        self.adopt_saved_at(&id, saved.saved_at);
                        tracing::info!(assessment = %id, "assessment saved");
                        Ok(SaveOutcome::Updated(id))
                    }
                    Err(error) => {
                        tracing::warn!(
                            assessment = %id,
                            %error,
                            "assessment update rejected, local copy kept"
                        );
                        Err(error.into())
                    }
                }
            }
        }
    }

    /// Take the server's save stamp; the local body may already be newer
    fn adopt_saved_at(&self, id: &AssessmentId, saved_at: Option<DateTime<Utc>>) {
        let Some(saved_at) = saved_at else {
            return;
        };
        self.write(|s| {
            let entry = s
                .workspaces
                .iter_mut()
                .find_map(|w| w.assessments.iter_mut().find(|a| a.id == *id));
            if let Some(entry) = entry {
                entry.saved_at = Some(saved_at);
            }
            if s.current_assessment.id == *id {
                s.current_assessment.saved_at = Some(saved_at);
            }
        });
    }

    async fn confirm_created(
        &self,
        workspace_id: &WorkspaceId,
        assessment: Assessment,
        tx: Transaction<AssessmentInsert>,
    ) -> Result<SaveOutcome, StoreError> {
        let local_id = assessment.id.clone();
        match self.remote().create_assessment(workspace_id, assessment).await {
            Ok(created) => {
                let id = created.id.clone();
                self.write(|s| {
                    s.pending_creates.remove(&local_id);
                    if let Some(workspace) = s.workspace_mut(workspace_id) {
                        if let Some(index) = workspace.position_of(&local_id) {
                            workspace.assessments[index] = created;
                        }
                    }
                    if s.current_assessment.id == local_id {
                        s.current_assessment.id = id.clone();
                    }
                    if id != local_id {
                        if let Some(bucket) = s.actions_by_assessment_id.remove(&local_id) {
                            s.actions_by_assessment_id.insert(id.clone(), bucket);
                        }
                    }
                });
                tx.confirm();
                tracing::info!(assessment = %id, "assessment created");
                Ok(SaveOutcome::Created(id))
            }
            Err(error) => {
                self.write(|s| tx.roll_back(s));
                tracing::warn!(assessment = %local_id, %error, "assessment create rejected");
                Err(error.into())
            }
        }
    }

    /// Replace one workspace's assessments with the remote list
    ///
    /// The current assessment body is left alone so unsaved edits survive.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown workspace (no remote call);
    /// [`StoreError::Remote`] when listing fails.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_assessments(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Assessment>, StoreError> {
        if self.read(|s| s.workspace(workspace_id).is_none()) {
            return Err(StoreError::NotFound {
                entity: "workspace",
                id: workspace_id.to_string(),
            });
        }
        let fetched = self.remote().list_assessments(workspace_id).await.map_err(|error| {
            tracing::warn!(%error, "assessment list failed");
            error
        })?;

        let assessments = self.write(|s| {
            let workspace = s.workspace_mut(workspace_id)?;
            workspace.assessments = fetched;
            workspace.dedupe_assessments();
            Some(workspace.assessments.clone())
        });
        Ok(assessments.unwrap_or_default())
    }

    /// Delete an assessment from whichever workspace holds it
    ///
    /// Returns `Ok(false)` when the id does not resolve.
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`] after the assessment was restored.
    pub async fn delete_assessment(&self, id: &AssessmentId) -> Result<bool, StoreError> {
        match self.begin_delete_assessment(id) {
            Some(pending) => self.settle_delete_assessment(pending).await.map(|()| true),
            None => Ok(false),
        }
    }

    /// Remove an assessment locally
    ///
    /// Deleting the current assessment loads the most recent remaining one
    /// (or a draft) and suppresses the next auto-save.
    pub fn begin_delete_assessment(&self, id: &AssessmentId) -> Option<PendingAssessmentDelete> {
        let default_framework = self.config().default_framework_id.clone();
        let removal = self.write(|s| {
            let workspace_id = s.workspace_of(id)?.id.clone();
            let was_current = s.current_assessment.id == *id;
            let prior = was_current.then(|| Pointers::capture(s));
            let workspace = s.workspace_mut(&workspace_id)?;
            let prior_updated_at = workspace.updated_at;
            let (index, assessment) = workspace.remove_assessment(id, Utc::now())?;

            let mut replaced_by = None;
            if was_current {
                s.enter_workspace(Some(workspace_id.clone()), &default_framework);
                s.skip_next_auto_save = true;
                replaced_by = Some(s.current_assessment.id.clone());
            }
            Some(AssessmentRemoval {
                workspace_id,
                index,
                assessment,
                prior_updated_at,
                prior,
                replaced_by,
            })
        });

        match &removal {
            None => tracing::debug!(assessment = %id, "delete ignored, assessment not found"),
            Some(undo) if undo.replaced_by.is_some() => self.announce_load(),
            Some(_) => {}
        }
        removal.map(|undo| PendingAssessmentDelete {
            id: id.clone(),
            tx: Transaction::applied("delete_assessment", undo),
        })
    }

    /// Call the remote and confirm or restore
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`] after the assessment was re-inserted at its
    /// former index.
    #[tracing::instrument(skip_all, fields(assessment = %pending.id))]
    pub async fn settle_delete_assessment(
        &self,
        pending: PendingAssessmentDelete,
    ) -> Result<(), StoreError> {
        let PendingAssessmentDelete { id, tx } = pending;
        match self.remote().delete_assessment(&id).await {
            Ok(()) => {
                self.write(|s| s.actions_by_assessment_id.remove(&id));
                tx.confirm();
                tracing::info!("assessment deleted");
                Ok(())
            }
            Err(error) => {
                self.write(|s| tx.roll_back(s));
                tracing::warn!(%error, "assessment delete rejected");
                Err(error.into())
            }
        }
    }
}
