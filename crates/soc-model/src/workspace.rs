//! Workspaces: named containers owning a collection of assessments

use crate::assessment::Assessment;
use crate::collection::{dedupe_by_key, insert_clamped};
use crate::ids::{AssessmentId, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named group of assessments for one engagement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(default)]
    pub assessments: Vec<Assessment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of an upsert into the assessment collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// Appended at the given index
    Inserted(usize),
    /// Replaced in place at the given index
    Replaced(usize),
}

impl Workspace {
    /// Create an empty workspace
    #[must_use]
    pub fn new(id: WorkspaceId, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            assessments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Position of an assessment in the collection
    #[inline]
    #[must_use]
    pub fn position_of(&self, id: &AssessmentId) -> Option<usize> {
        self.assessments.iter().position(|a| &a.id == id)
    }

    /// Whether the collection holds this assessment
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &AssessmentId) -> bool {
        self.position_of(id).is_some()
    }

    /// Look up an assessment
    #[must_use]
    pub fn assessment(&self, id: &AssessmentId) -> Option<&Assessment> {
        self.assessments.iter().find(|a| &a.id == id)
    }

    /// Replace in place or append, bumping `updated_at`
    pub fn upsert_assessment(&mut self, assessment: Assessment, now: DateTime<Utc>) -> Upsert {
        self.updated_at = now;
        match self.position_of(&assessment.id) {
            Some(idx) => {
                self.assessments[idx] = assessment;
                Upsert::Replaced(idx)
            }
            None => {
                self.assessments.push(assessment);
                Upsert::Inserted(self.assessments.len() - 1)
            }
        }
    }

    /// Remove an assessment, returning its former position
    pub fn remove_assessment(
        &mut self,
        id: &AssessmentId,
        now: DateTime<Utc>,
    ) -> Option<(usize, Assessment)> {
        let idx = self.position_of(id)?;
        self.updated_at = now;
        Some((idx, self.assessments.remove(idx)))
    }

    /// Put a removed assessment back where it was
    pub fn restore_assessment(&mut self, index: usize, assessment: Assessment) -> usize {
        insert_clamped(&mut self.assessments, index, assessment)
    }

    /// Assessment with the latest `saved_at`; ties keep collection order
    #[must_use]
    pub fn most_recent_assessment(&self) -> Option<&Assessment> {
        self.assessments
            .iter()
            .reduce(|best, next| if next.saved_at > best.saved_at { next } else { best })
    }

    /// Drop duplicate assessment ids, keeping the first
    pub fn dedupe_assessments(&mut self) -> usize {
        dedupe_by_key(&mut self.assessments, |a| a.id.clone())
    }
}

/// Fields accepted by remote workspace creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWorkspace {
    pub name: String,
}

/// Partial workspace update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspacePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
