//! Raw records into canonical model values, backfilling defaults

use crate::lenient::{each, non_blank, string_entries};
use crate::versions::{RawActionPlan, RawAssessment, RawMetadata, RawWorkspace};
use crate::HydrateOptions;
use chrono::{DateTime, Utc};
use serde_json::Value;
use soc_model::metadata::DEFAULT_TITLE;
use soc_model::{
    ActionPlan, Assessment, AssessmentId, Metadata, Recommendation, SoctomEntry, Workspace,
    WorkspaceId,
};
use std::collections::BTreeMap;

/// Fill every metadata field, applying the legacy fallback chains
///
/// - title: `assessmentTitle`, else `name`, else the default title
/// - budget: `budgetAmount`, else the legacy `budget`, else empty
pub(crate) fn metadata(raw: Option<RawMetadata>) -> Metadata {
    let Some(raw) = raw else {
        return Metadata::default();
    };
    let template = Metadata::default();

    let objectives = raw.objectives.map(|values| {
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect::<Vec<_>>()
    });

    Metadata {
        assessment_title: non_blank(raw.assessment_title)
            .or_else(|| non_blank(raw.name.clone()))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        name: raw.name.unwrap_or(template.name),
        budget_amount: raw.budget_amount.or(raw.budget).unwrap_or_default(),
        budget_currency: raw.budget_currency.unwrap_or(template.budget_currency),
        size: raw.size.unwrap_or(template.size),
        sector: raw.sector.unwrap_or(template.sector),
        soc_age: raw.soc_age.unwrap_or(template.soc_age),
        objectives: objectives.unwrap_or(template.objectives),
        status: raw.status.unwrap_or(template.status),
        language: non_blank(raw.language).unwrap_or(template.language),
    }
}

fn action_plan(raw: Option<RawActionPlan>) -> ActionPlan {
    let Some(raw) = raw else {
        return ActionPlan::default();
    };
    let steps: Vec<String> = raw
        .steps
        .into_iter()
        .flatten()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect();
    let raw_text = raw.raw.unwrap_or_else(|| steps.join("\n"));
    ActionPlan {
        steps,
        raw: raw_text,
        error: raw.error,
    }
}

fn recommendation(value: Value) -> Option<Recommendation> {
    match value {
        Value::String(text) => Some(Recommendation::new(text)),
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    }
}

/// Canonical assessment; a missing id is generated, a blank framework defaulted
pub(crate) fn assessment(raw: RawAssessment, options: &HydrateOptions) -> Assessment {
    let soctom_data: BTreeMap<String, SoctomEntry> = raw
        .soctom_data
        .into_iter()
        .flatten()
        .filter_map(|(code, value)| Some((code, serde_json::from_value(value).ok()?)))
        .collect();

    let aspect_recommendations = raw
        .aspect_recommendations
        .into_iter()
        .flatten()
        .filter_map(|(key, value)| Some((key, recommendation(value)?)))
        .collect();

    Assessment {
        id: non_blank(raw.id).map_or_else(AssessmentId::generate, AssessmentId::from),
        framework_id: non_blank(raw.framework_id)
            .unwrap_or_else(|| options.default_framework_id.clone()),
        answers: string_entries(raw.answers).collect(),
        notes: string_entries(raw.notes).collect(),
        soctom_data,
        metadata: metadata(raw.metadata),
        action_plan: action_plan(raw.action_plan),
        aspect_recommendations,
        saved_at: raw.saved_at,
    }
}

/// Decode and normalize a list of raw assessment values
pub(crate) fn assessments(values: Option<Vec<Value>>, options: &HydrateOptions) -> Vec<Assessment> {
    each::<RawAssessment>(values)
        .into_iter()
        .map(|raw| assessment(raw, options))
        .collect()
}

/// Canonical workspace; a missing timestamp borrows the other one, then `now`
pub(crate) fn workspace(
    raw: RawWorkspace,
    options: &HydrateOptions,
    now: DateTime<Utc>,
) -> Workspace {
    let created_at = raw.created_at.or(raw.updated_at).unwrap_or(now);
    let mut workspace = Workspace {
        id: non_blank(raw.id).map_or_else(WorkspaceId::generate, WorkspaceId::from),
        name: non_blank(raw.name).unwrap_or_else(|| options.default_workspace_name.clone()),
        assessments: assessments(raw.assessments, options),
        created_at,
        updated_at: raw.updated_at.unwrap_or(created_at),
    };
    workspace.dedupe_assessments();
    workspace
}
