//! Generative-text collaborator and prompt construction

use crate::error::AiError;
use serde::{Deserialize, Serialize};
use soc_model::{
    ActionPriority, ActionSource, AiSettings, AssessmentId, Metadata, NewAction, QuestionCode,
};
use soc_scoring::Scores;
use std::collections::BTreeMap;

/// Plan text stored when no API key is configured
pub const MISSING_KEY_PLAN: &str = "Provide an API key to request an AI action plan.";

/// Plan text stored when generation fails
pub const FALLBACK_PLAN: &str =
    "Failed to generate action plan automatically. Please try again later.";

const SYSTEM_PROMPT: &str = "You are a seasoned SOC transformation advisor.";

/// Chat-style prompt payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanPrompt {
    /// System role message
    pub system: String,
    /// User message carrying the assessment context
    pub user: String,
}

/// Structured remediation item proposed by the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedAction {
    /// Short title
    pub title: String,
    /// Details
    #[serde(default)]
    pub description: String,
    /// Suggested priority
    #[serde(default)]
    pub priority: ActionPriority,
    /// Optional grouping label
    #[serde(default)]
    pub category: Option<String>,
}

impl SuggestedAction {
    /// Creation fields for an AI-sourced action
    #[must_use]
    pub fn into_new_action(self, assessment_id: AssessmentId) -> NewAction {
        let mut fields = NewAction::new(assessment_id, self.title)
            .with_description(self.description)
            .with_priority(self.priority)
            .with_source(ActionSource::Ai);
        if let Some(category) = self.category {
            fields = fields.with_category(category);
        }
        fields
    }
}

/// Produces action plans from assessment context
///
/// Implementations must return `Err` for provider failures so callers can
/// tell them apart from an empty answer.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ActionPlanGenerator: Send + Sync {
    /// Free-text improvement plan
    async fn generate_plan(
        &self,
        settings: &AiSettings,
        prompt: &PlanPrompt,
    ) -> Result<String, AiError>;

    /// Structured action items
    async fn generate_actions(
        &self,
        settings: &AiSettings,
        prompt: &PlanPrompt,
    ) -> Result<Vec<SuggestedAction>, AiError>;
}

/// Trim the base URL and drop trailing slashes, defaulting when blank
#[must_use]
pub fn normalize_api_base(api_base: &str, default: &str) -> String {
    let trimmed = api_base.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        default.trim_end_matches('/').to_string()
    } else {
        trimmed.to_string()
    }
}

fn or_na<'a>(value: &'a str, fallback: &'static str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn context(
    framework_name: &str,
    metadata: &Metadata,
    scores: &Scores,
    answers: &BTreeMap<QuestionCode, String>,
) -> String {
    let budget = if metadata.budget_amount.trim().is_empty() {
        "n/a".to_string()
    } else {
        format!(
            "{}{}",
            or_na(&metadata.budget_currency, "$"),
            metadata.budget_amount
        )
    };
    let objectives = if metadata.objectives.is_empty() {
        "Not specified".to_string()
    } else {
        metadata.objectives.join(", ")
    };
    let scores_json = serde_json::to_string(scores).unwrap_or_default();
    let answers_json = serde_json::to_string(answers).unwrap_or_default();

    format!(
        "Framework: {framework_name}\n\
         Organization: {} ({}) in sector {} with budget {budget}. SOC age: {}.\n\
         Objectives: {objectives}.\n\
         Scores: {scores_json}\n\
         Answers: {answers_json}",
        or_na(&metadata.name, "Unknown"),
        or_na(&metadata.size, "size n/a"),
        or_na(&metadata.sector, "n/a"),
        or_na(&metadata.soc_age, "n/a"),
    )
}

/// Prompt for a free-text plan
#[must_use]
pub fn build_plan_prompt(
    framework_name: &str,
    metadata: &Metadata,
    scores: &Scores,
    answers: &BTreeMap<QuestionCode, String>,
) -> PlanPrompt {
    PlanPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user: format!(
            "You are an SOC consultant. Build a concise, prioritized action plan.\n{}\n\
             Respond with 5-8 actionable steps, each including rationale and expected impact.",
            context(framework_name, metadata, scores, answers)
        ),
    }
}

/// Prompt for structured action items, capped at `max_items`
#[must_use]
pub fn build_actions_prompt(
    framework_name: &str,
    metadata: &Metadata,
    scores: &Scores,
    answers: &BTreeMap<QuestionCode, String>,
    max_items: usize,
) -> PlanPrompt {
    PlanPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user: format!(
            "You are an SOC consultant. Propose remediation actions.\n{}\n\
             Respond with a JSON array of at most {max_items} objects with fields \
             title, description, priority (low, medium or high) and category.",
            context(framework_name, metadata, scores, answers)
        ),
    }
}
