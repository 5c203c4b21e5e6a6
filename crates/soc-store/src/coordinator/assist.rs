//! Generated plans, AI-seeded actions and the bulk local import

use crate::ai::{
    build_actions_prompt, build_plan_prompt, normalize_api_base, FALLBACK_PLAN, MISSING_KEY_PLAN,
};
use crate::error::{AiError, StoreError};
use crate::remote::ImportSummary;
use crate::store::AssessmentStore;
use soc_model::{Action, ActionPlan, AiSettings, Assessment, AssessmentId};
use soc_scoring::compute_scores;

impl AssessmentStore {
    fn effective_ai_settings(&self) -> AiSettings {
        let mut settings = self.ai_settings();
        settings.api_base = normalize_api_base(&settings.api_base, &self.config().ai.api_base);
        if settings.model.trim().is_empty() {
            settings.model.clone_from(&self.config().ai.model);
        }
        settings
    }

    fn find_assessment(&self, id: &AssessmentId) -> Option<Assessment> {
        self.read(|s| {
            if s.current_assessment.id == *id {
                return Some(s.current_assessment.clone());
            }
            s.workspace_of(id).and_then(|w| w.assessment(id)).cloned()
        })
    }

    /// Ask the generator for a plan and store it on the current assessment
    ///
    /// Never fails because of the generator: without an API key a
    /// placeholder plan is stored and nothing is called, and a generator
    /// error yields a fallback plan with `error` set. The plan is discarded
    /// if another assessment became current meanwhile.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownFramework`] when the framework is not loaded.
    #[tracing::instrument(skip(self))]
    pub async fn generate_action_plan(&self) -> Result<ActionPlan, StoreError> {
        let assessment = self.current_assessment();
        let framework = self.framework(&assessment.framework_id)?;
        let settings = self.effective_ai_settings();

        let plan = if settings.has_key() {
            let scores = compute_scores(framework, &assessment.answers);
            let prompt = build_plan_prompt(
                &framework.name,
                &assessment.metadata,
                &scores,
                &assessment.answers,
            );
            match self.generator().generate_plan(&settings, &prompt).await {
                Ok(text) => ActionPlan::from_text(text),
                Err(error) => {
                    tracing::warn!(%error, "plan generation failed, storing fallback");
                    ActionPlan {
                        error: Some(error.to_string()),
                        ..ActionPlan::from_text(FALLBACK_PLAN)
                    }
                }
            }
        } else {
            tracing::debug!("no API key, storing placeholder plan");
            ActionPlan::from_text(MISSING_KEY_PLAN)
        };

        if self.read(|s| s.current_assessment.id == assessment.id) {
            self.set_action_plan(plan.clone());
        } else {
            tracing::debug!(
                assessment = %assessment.id,
                "current assessment changed, plan not stored"
            );
        }
        Ok(plan)
    }

    /// Ask the generator for structured actions and bulk-create them
    ///
    /// Suggestions beyond the bulk limit are dropped; an empty answer
    /// creates nothing.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown assessment,
    /// [`StoreError::Ai`] when no key is set or the generator fails, and
    /// any error of [`AssessmentStore::create_actions`].
    #[tracing::instrument(skip(self))]
    pub async fn seed_actions_from_ai(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<Vec<Action>, StoreError> {
        let assessment = self
            .find_assessment(assessment_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "assessment",
                id: assessment_id.to_string(),
            })?;
        let framework = self.framework(&assessment.framework_id)?;
        let settings = self.effective_ai_settings();
        if !settings.has_key() {
            return Err(AiError::Unauthorized.into());
        }

        let max = self.config().max_bulk_actions;
        let scores = compute_scores(framework, &assessment.answers);
        let prompt = build_actions_prompt(
            &framework.name,
            &assessment.metadata,
            &scores,
            &assessment.answers,
            max,
        );
        let mut suggestions = self
            .generator()
            .generate_actions(&settings, &prompt)
            .await
            .map_err(|error| {
                tracing::warn!(%error, "action generation failed");
                error
            })?;
        suggestions.truncate(max);
        if suggestions.is_empty() {
            tracing::debug!("generator proposed no actions");
            return Ok(Vec::new());
        }

        let fields = suggestions
            .into_iter()
            .map(|s| s.into_new_action(assessment_id.clone()))
            .collect();
        self.create_actions(assessment_id, fields).await
    }

    /// Send every local workspace to the remote bulk import
    ///
    /// # Errors
    ///
    /// [`StoreError::Remote`] when the import is rejected.
    #[tracing::instrument(skip(self))]
    pub async fn push_migration(&self) -> Result<ImportSummary, StoreError> {
        let payload = self.migration_payload();
        let local = payload.assessment_count();
        let summary = self.remote().import_local(payload).await.map_err(|error| {
            tracing::warn!(%error, "local import rejected");
            error
        })?;
        tracing::info!(
            workspaces = summary.workspaces,
            assessments = summary.assessments,
            local,
            "local data imported"
        );
        Ok(summary)
    }
}
