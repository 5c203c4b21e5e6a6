//! Remediation actions tracked per assessment

use crate::error::ModelError;
use crate::ids::{ActionId, AssessmentId, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest title (in characters) the server stores
pub const MAX_TITLE_LEN: usize = 255;

/// Board column of an action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    #[default]
    Todo,
    Doing,
    Done,
}

impl ActionStatus {
    /// Sort rank, earliest column first
    #[inline]
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Todo => 0,
            Self::Doing => 1,
            Self::Done => 2,
        }
    }
}

/// Urgency of an action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl ActionPriority {
    /// Sort rank, most urgent first
    #[inline]
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

/// Origin of an action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionSource {
    #[default]
    Manual,
    Ai,
}

/// Remediation task owned by one assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: ActionId,
    pub assessment_id: AssessmentId,
    pub workspace_id: WorkspaceId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ActionStatus,
    #[serde(default)]
    pub priority: ActionPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: ActionSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAction {
    pub assessment_id: AssessmentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<WorkspaceId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ActionStatus,
    #[serde(default)]
    pub priority: ActionPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: ActionSource,
}

impl NewAction {
    /// Manual todo with medium priority
    #[must_use]
    pub fn new(assessment_id: AssessmentId, title: impl Into<String>) -> Self {
        Self {
            assessment_id,
            workspace_id: None,
            title: title.into(),
            description: String::new(),
            status: ActionStatus::Todo,
            priority: ActionPriority::Medium,
            category: None,
            owner: None,
            due_date: None,
            source: ActionSource::Manual,
        }
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With priority
    #[must_use]
    pub fn with_priority(mut self, priority: ActionPriority) -> Self {
        self.priority = priority;
        self
    }

    /// With category
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// With source
    #[must_use]
    pub fn with_source(mut self, source: ActionSource) -> Self {
        self.source = source;
        self
    }

    /// Trim and bound the title; reject blank titles
    ///
    /// # Errors
    /// `ModelError::MissingField` when the title is blank
    pub fn validate(mut self) -> Result<Self, ModelError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ModelError::MissingField("title"));
        }
        self.title = title.chars().take(MAX_TITLE_LEN).collect();
        if let Some(owner) = self.owner.take() {
            self.owner = Some(owner.chars().take(MAX_TITLE_LEN).collect());
        }
        Ok(self)
    }

    /// Locally-tagged record shown until the server confirms
    #[must_use]
    pub fn placeholder(&self, workspace_id: WorkspaceId, now: DateTime<Utc>) -> Action {
        Action {
            id: ActionId::temporary(),
            assessment_id: self.assessment_id.clone(),
            workspace_id,
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
            category: self.category.clone(),
            owner: self.owner.clone(),
            due_date: self.due_date,
            source: self.source,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial action update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ActionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<ActionPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// `Some(None)` clears the due date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl ActionPatch {
    /// Move to another column
    #[must_use]
    pub fn status(status: ActionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// True when no field is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to a cached record
    pub fn apply_to(&self, action: &mut Action, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            action.title = title.trim().chars().take(MAX_TITLE_LEN).collect();
        }
        if let Some(description) = &self.description {
            action.description.clone_from(description);
        }
        if let Some(status) = self.status {
            action.status = status;
        }
        if let Some(priority) = self.priority {
            action.priority = priority;
        }
        if let Some(category) = &self.category {
            action.category = Some(category.clone());
        }
        if let Some(owner) = &self.owner {
            action.owner = Some(owner.chars().take(MAX_TITLE_LEN).collect());
        }
        if let Some(due_date) = self.due_date {
            action.due_date = due_date;
        }
        action.updated_at = now;
    }
}

/// Order actions the way the server lists them: status, priority, newest first
pub fn sort_actions(actions: &mut [Action]) {
    actions.sort_by(|a, b| {
        a.status
            .rank()
            .cmp(&b.status.rank())
            .then(a.priority.rank().cmp(&b.priority.rank()))
            .then(b.created_at.cmp(&a.created_at))
    });
}
