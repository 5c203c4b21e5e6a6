//! Remediation action cache and its remote mutations

use crate::error::StoreError;
use crate::store::AssessmentStore;
use crate::tx::{ActionInserts, ActionRemoval, Transaction};
use chrono::Utc;
use soc_model::{
    dedupe_by_key, sort_actions, Action, ActionId, ActionPatch, AppState, AssessmentId, NewAction,
    WorkspaceId,
};

/// Action create between its local and remote phases
#[derive(Debug)]
#[must_use = "settle the pending create to confirm or roll it back"]
pub struct PendingActionCreate {
    assessment_id: AssessmentId,
    fields: Vec<NewAction>,
    bulk: bool,
    tx: Transaction<ActionInserts>,
}

impl PendingActionCreate {
    /// Placeholder ids, in request order
    #[must_use]
    pub fn temp_ids(&self) -> &[ActionId] {
        &self.tx.snapshot().temp_ids
    }

    /// Bucket the placeholders live in
    #[must_use]
    pub fn assessment_id(&self) -> &AssessmentId {
        &self.assessment_id
    }
}

/// Action delete between its local and remote phases
#[derive(Debug)]
#[must_use = "settle the pending delete to confirm or roll it back"]
pub struct PendingActionDelete {
    id: ActionId,
    tx: Transaction<ActionRemoval>,
}

impl PendingActionDelete {
    /// Id being deleted
    #[must_use]
    pub fn id(&self) -> &ActionId {
        &self.id
    }

    /// Position the action held in its bucket
    #[must_use]
    pub fn index(&self) -> usize {
        self.tx.snapshot().index
    }
}

fn owning_workspace(
    state: &AppState,
    assessment_id: &AssessmentId,
    requested: Option<&WorkspaceId>,
) -> Option<WorkspaceId> {
    if let Some(id) = requested {
        return Some(id.clone());
    }
    state
        .workspace_of(assessment_id)
        .map(|w| w.id.clone())
        .or_else(|| {
            (state.current_assessment.id == *assessment_id)
                .then(|| state.current_workspace_id.clone())
                .flatten()
        })
}

fn normalize_bucket(bucket: &mut Vec<Action>) {
    dedupe_by_key(bucket, |a| a.id.clone());
    sort_actions(bucket);
}

fn reject_temporary(id: &ActionId) -> Result<(), StoreError> {
    if id.is_temporary() {
        return Err(StoreError::validation("action is still being created"));
    }
    Ok(())
}

impl AssessmentStore {
    /// Replace the cached actions of one assessment with the remote list
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`] when listing fails; the cache is untouched.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_actions(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<Vec<Action>, StoreError> {
        let mut fetched = self.remote().list_actions(assessment_id).await.map_err(|error| {
            tracing::warn!(%error, "action list failed");
            error
        })?;
        normalize_bucket(&mut fetched);
        self.write(|s| {
            s.actions_by_assessment_id
                .insert(assessment_id.clone(), fetched.clone());
        });
        Ok(fetched)
    }

    /// Create one action
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] for a blank title; [`StoreError::NotFound`]
    /// when the assessment belongs to no workspace; [`StoreError::Remote`]
    /// after the placeholder was removed.
    pub async fn create_action(&self, fields: NewAction) -> Result<Action, StoreError> {
        let pending = self.begin_create_action(fields)?;
        let mut created = self.settle_create_actions(pending).await?;
        created
            .pop()
            .ok_or_else(|| StoreError::validation("remote returned no action"))
    }

    /// Create several actions for one assessment in one request
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] for an empty or oversized batch or a blank
    /// title; [`StoreError::NotFound`] when the assessment belongs to no
    /// workspace; [`StoreError::Remote`] after all placeholders were removed.
    pub async fn create_actions(
        &self,
        assessment_id: &AssessmentId,
        fields: Vec<NewAction>,
    ) -> Result<Vec<Action>, StoreError> {
        let pending = self.begin_create_actions(assessment_id, fields)?;
        self.settle_create_actions(pending).await
    }

    /// Insert a placeholder for one action
    ///
    /// # Errors
    ///
    /// See [`AssessmentStore::create_action`].
    pub fn begin_create_action(
        &self,
        fields: NewAction,
    ) -> Result<PendingActionCreate, StoreError> {
        let assessment_id = fields.assessment_id.clone();
        self.insert_placeholders(assessment_id, vec![fields.validate()?], false)
    }

    /// Insert placeholders for a batch
    ///
    /// # Errors
    ///
    /// See [`AssessmentStore::create_actions`].
    pub fn begin_create_actions(
        &self,
        assessment_id: &AssessmentId,
        fields: Vec<NewAction>,
    ) -> Result<PendingActionCreate, StoreError> {
        let max = self.config().max_bulk_actions;
        if fields.is_empty() {
            return Err(StoreError::validation("at least one action is required"));
        }
        if fields.len() > max {
            return Err(StoreError::validation(format!(
                "at most {max} actions per request, got {}",
                fields.len()
            )));
        }
        let fields = fields
            .into_iter()
            .map(|mut f| {
                f.assessment_id = assessment_id.clone();
                f.validate()
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.insert_placeholders(assessment_id.clone(), fields, true)
    }

    fn insert_placeholders(
        &self,
        assessment_id: AssessmentId,
        mut fields: Vec<NewAction>,
        bulk: bool,
    ) -> Result<PendingActionCreate, StoreError> {
        let now = Utc::now();
        let temp_ids = self.write(|s| {
            let requested = fields.first().and_then(|f| f.workspace_id.as_ref());
            let workspace_id = owning_workspace(s, &assessment_id, requested)?;
            let placeholders: Vec<Action> = fields
                .iter_mut()
                .map(|f| {
                    f.workspace_id = Some(workspace_id.clone());
                    f.placeholder(workspace_id.clone(), now)
                })
                .collect();
            let temp_ids = placeholders.iter().map(|a| a.id.clone()).collect();
            let bucket = s
                .actions_by_assessment_id
                .entry(assessment_id.clone())
                .or_default();
            bucket.extend(placeholders);
            sort_actions(bucket);
            Some(temp_ids)
        });

        let Some(temp_ids) = temp_ids else {
            return Err(StoreError::NotFound {
                entity: "assessment",
                id: assessment_id.to_string(),
            });
        };
        Ok(PendingActionCreate {
            tx: Transaction::applied(
                if bulk { "create_actions" } else { "create_action" },
                ActionInserts {
                    assessment_id: assessment_id.clone(),
                    temp_ids,
                },
            ),
            assessment_id,
            fields,
            bulk,
        })
    }

    /// Call the remote and swap placeholders for server records
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`] after every placeholder was removed.
    #[tracing::instrument(
        skip_all,
        fields(assessment = %pending.assessment_id, count = pending.fields.len())
    )]
    pub async fn settle_create_actions(
        &self,
        pending: PendingActionCreate,
    ) -> Result<Vec<Action>, StoreError> {
        let PendingActionCreate {
            assessment_id,
            mut fields,
            bulk,
            tx,
        } = pending;

        let result = match (bulk, fields.pop()) {
            (false, Some(single)) if fields.is_empty() => {
                self.remote().create_action(single).await.map(|a| vec![a])
            }
            (_, last) => {
                fields.extend(last);
                self.remote().create_actions(&assessment_id, fields).await
            }
        };

        match result {
            Ok(created) => {
                let temp_ids = tx.snapshot().temp_ids.clone();
                self.write(|s| {
                    let bucket = s.actions_by_assessment_id.entry(assessment_id).or_default();
                    bucket.retain(|a| !temp_ids.contains(&a.id));
                    bucket.extend(created.iter().cloned());
                    normalize_bucket(bucket);
                });
                tx.confirm();
                tracing::info!(count = created.len(), "actions created");
                Ok(created)
            }
            Err(error) => {
                self.write(|s| tx.roll_back(s));
                tracing::warn!(%error, "action create rejected");
                Err(error.into())
            }
        }
    }

    /// Patch an action wherever it is cached
    ///
    /// A rejection is surfaced and the local patch is kept. Returns
    /// `Ok(None)` when the id is not cached.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] for an empty patch or a placeholder id;
    /// [`StoreError::Remote`] when the update is rejected.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_action(
        &self,
        id: &ActionId,
        patch: ActionPatch,
    ) -> Result<Option<Action>, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::validation("action patch is empty"));
        }
        reject_temporary(id)?;

        let now = Utc::now();
        let found = self.write(|s| {
            let mut found = false;
            for bucket in s.actions_by_assessment_id.values_mut() {
                for action in bucket.iter_mut().filter(|a| a.id == *id) {
                    patch.apply_to(action, now);
                    found = true;
                }
                sort_actions(bucket);
            }
            found
        });
        if !found {
            tracing::debug!("update ignored, action not cached");
            return Ok(None);
        }

        match self.remote().update_action(id, patch).await {
            Ok(updated) => {
                self.write(|s| {
                    for bucket in s.actions_by_assessment_id.values_mut() {
                        let mut touched = false;
                        for action in bucket.iter_mut().filter(|a| a.id == *id) {
                            *action = updated.clone();
                            touched = true;
                        }
                        if touched {
                            sort_actions(bucket);
                        }
                    }
                });
                tracing::info!("action updated");
                Ok(Some(updated))
            }
            Err(error) => {
                tracing::warn!(%error, "action update rejected, local patch kept");
                Err(error.into())
            }
        }
    }

    /// Delete an action; `Ok(false)` when it is not cached
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] for a placeholder id;
    /// [`StoreError::Remote`] after the action was restored.
    pub async fn delete_action(&self, id: &ActionId) -> Result<bool, StoreError> {
        match self.begin_delete_action(id)? {
            Some(pending) => self.settle_delete_action(pending).await.map(|()| true),
            None => Ok(false),
        }
    }

    /// Remove an action from its bucket
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] for a placeholder id.
    pub fn begin_delete_action(
        &self,
        id: &ActionId,
    ) -> Result<Option<PendingActionDelete>, StoreError> {
        reject_temporary(id)?;
        let removal = self.write(|s| {
            s.actions_by_assessment_id
                .iter_mut()
                .find_map(|(assessment_id, bucket)| {
                    let index = bucket.iter().position(|a| a.id == *id)?;
                    Some(ActionRemoval {
                        assessment_id: assessment_id.clone(),
                        index,
                        action: bucket.remove(index),
                    })
                })
        });
        Ok(removal.map(|undo| PendingActionDelete {
            id: id.clone(),
            tx: Transaction::applied("delete_action", undo),
        }))
    }

    /// Call the remote and confirm or restore
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`] after the action was re-inserted at its
    /// former index.
    #[tracing::instrument(skip_all, fields(action = %pending.id))]
    pub async fn settle_delete_action(
        &self,
        pending: PendingActionDelete,
    ) -> Result<(), StoreError> {
        let PendingActionDelete { id, tx } = pending;
        match self.remote().delete_action(&id).await {
            Ok(()) => {
                tx.confirm();
                tracing::info!("action deleted");
                Ok(())
            }
            Err(error) => {
                self.write(|s| tx.roll_back(s));
                tracing::warn!(%error, "action delete rejected");
                Err(error.into())
            }
        }
    }
}
