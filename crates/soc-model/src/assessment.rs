//! Assessments: one questionnaire run against one framework

use crate::ids::AssessmentId;
use crate::metadata::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Question code within a framework (e.g. `"1.2.3"`)
pub type QuestionCode = String;

/// Aspect key in `domain::aspect` form
pub type AspectKey = String;

/// Operating-model answer for one question
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoctomEntry {
    /// Description of the current state
    pub current_state: String,
    /// Description of the desired target state
    pub target_state: String,
    /// Whether the question is excluded from improvement planning
    pub skip_improvement: bool,
}

impl SoctomEntry {
    /// True when nothing was entered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current_state.trim().is_empty()
            && self.target_state.trim().is_empty()
            && !self.skip_improvement
    }
}

/// Generated improvement plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionPlan {
    /// Non-empty lines of the plan
    pub steps: Vec<String>,
    /// Full plan text
    pub raw: String,
    /// Failure reported by the generator, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionPlan {
    /// Build a plan from generated text
    #[must_use]
    pub fn from_text(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let steps = raw
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        Self {
            steps,
            raw,
            error: None,
        }
    }

    /// Whether the plan carries any text
    #[inline]
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.raw.trim().is_empty() || self.steps.iter().any(|s| !s.trim().is_empty())
    }
}

/// Per-aspect recommendation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Recommendation body
    pub text: String,
    /// When it was generated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl Recommendation {
    /// Create recommendation with text only
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            generated_at: None,
        }
    }
}

/// One in-progress or completed questionnaire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: AssessmentId,
    pub framework_id: String,
    pub answers: BTreeMap<QuestionCode, String>,
    pub notes: BTreeMap<QuestionCode, String>,
    pub soctom_data: BTreeMap<QuestionCode, SoctomEntry>,
    pub metadata: Metadata,
    pub action_plan: ActionPlan,
    pub aspect_recommendations: BTreeMap<AspectKey, Recommendation>,
    /// Last persist time; `None` for drafts never saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Assessment {
    /// Build an in-memory draft
    #[must_use]
    pub fn draft(framework_id: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id: AssessmentId::generate(),
            framework_id: framework_id.into(),
            answers: BTreeMap::new(),
            notes: BTreeMap::new(),
            soctom_data: BTreeMap::new(),
            metadata,
            action_plan: ActionPlan::default(),
            aspect_recommendations: BTreeMap::new(),
            saved_at: None,
        }
    }

    /// Whether the user entered anything beyond the default template
    #[must_use]
    pub fn has_user_content(&self) -> bool {
        self.answers.values().any(|v| !v.trim().is_empty())
            || self.notes.values().any(|v| !v.trim().is_empty())
            || self.soctom_data.values().any(|e| !e.is_empty())
            || self.action_plan.has_content()
            || !self.aspect_recommendations.is_empty()
            || self.metadata.diverges_from_template()
    }

    /// Drop everything tied to the framework; metadata survives
    pub fn reset_framework_content(&mut self, framework_id: impl Into<String>) {
        self.framework_id = framework_id.into();
        self.answers.clear();
        self.notes.clear();
        self.soctom_data.clear();
        self.action_plan = ActionPlan::default();
    }

    /// Mutable soctom entry, created on first touch
    pub fn soctom_entry_mut(&mut self, code: &str) -> &mut SoctomEntry {
        self.soctom_data.entry(code.to_string()).or_default()
    }
}

/// Gate for adding an assessment to a workspace collection
///
/// New assessments are persisted only once they carry user content. One that
/// already exists in the collection is always persisted so a deliberate clear
/// reaches the server.
#[inline]
#[must_use]
pub fn is_worth_persisting(assessment: &Assessment, already_persisted: bool) -> bool {
    already_persisted || assessment.has_user_content()
}
