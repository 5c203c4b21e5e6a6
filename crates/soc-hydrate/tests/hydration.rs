//! End-to-end hydration over every persisted generation

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use soc_hydrate::{dehydrate, hydrate, hydrate_at, hydrate_str, import_assessment, HydrateOptions};
use soc_model::{Metadata, Theme};

fn options() -> HydrateOptions {
    HydrateOptions::default()
}

#[test]
fn absent_blob_is_a_fresh_state() {
    let state = hydrate(None, &options());
    assert_eq!(state.workspaces.len(), 1);
    assert_eq!(state.workspaces[0].name, "Default Workspace");
    assert!(state.workspaces[0].assessments.is_empty());
    assert_eq!(state.current_assessment.framework_id, "soc_cmm");
    assert_eq!(state.current_assessment.metadata, Metadata::default());
    assert!(state.ai.api_key.is_empty());
    assert_eq!(state.ai.model, "grok-4-latest");
}

#[test]
fn garbage_text_is_a_fresh_state() {
    let state = hydrate_str("{not json", &options());
    assert_eq!(state.workspaces.len(), 1);
}

#[test]
fn bare_legacy_assessment_becomes_current_draft() {
    let blob = json!({
        "frameworkId": "sim3",
        "answers": {"1.1": "Managed", "1.2": 4},
        "notes": {"1.1": "SIEM only"},
        "metadata": {"name": "Acme", "budget": "250k"},
        "theme": "dark"
    });
    let state = hydrate(Some(&blob), &options());

    assert_eq!(state.workspaces.len(), 1);
    assert!(state.workspaces[0].assessments.is_empty());
    let current = &state.current_assessment;
    assert_eq!(current.framework_id, "sim3");
    assert_eq!(current.answers.len(), 1);
    assert_eq!(current.metadata.assessment_title, "Acme");
    assert_eq!(current.metadata.budget_amount, "250k");
    assert_eq!(current.metadata.objectives, Metadata::default().objectives);
    assert_eq!(state.theme, Theme::Dark);
}

#[test]
fn history_moves_into_synthesized_workspace() {
    let blob = json!({
        "currentAssessment": {"id": "a2", "answers": {"1.1": "draft edit"}},
        "assessmentHistory": [
            {"id": "a1", "savedAt": "2024-01-01T00:00:00Z"},
            {"id": "a2", "savedAt": "2024-02-01T00:00:00Z", "answers": {"1.1": "saved"}}
        ]
    });
    let state = hydrate(Some(&blob), &options());

    let ws = &state.workspaces[0];
    assert_eq!(ws.name, "Default Workspace");
    assert_eq!(ws.assessments.len(), 2);
    assert_eq!(state.current_assessment.id.as_str(), "a2");
    assert_eq!(state.current_assessment.answers["1.1"], "draft edit");
}

#[test]
fn missing_pointer_selects_most_recent() {
    let blob = json!({
        "workspaces": [{
            "id": "w1",
            "name": "Acme",
            "assessments": [
                {"id": "old", "savedAt": "2024-01-01T00:00:00Z"},
                {"id": "new", "savedAt": "2024-03-01T00:00:00Z"},
                {"id": "mid", "savedAt": "2024-02-01T00:00:00Z"}
            ]
        }]
    });
    let state = hydrate(Some(&blob), &options());
    assert_eq!(state.current_workspace_id.unwrap().as_str(), "w1");
    assert_eq!(state.current_assessment.id.as_str(), "new");
}

#[test]
fn pointer_to_unknown_assessment_falls_back_to_most_recent() {
    let blob = json!({
        "workspaces": [{"id": "w1", "assessments": [{"id": "only"}]}],
        "currentWorkspaceId": "w1",
        "currentAssessmentId": "deleted"
    });
    let state = hydrate(Some(&blob), &options());
    assert_eq!(state.current_assessment.id.as_str(), "only");
}

#[test]
fn persisted_draft_survives_in_empty_workspace() {
    let blob = json!({
        "schemaVersion": 2,
        "workspaces": [{"id": "w1", "name": "Acme"}],
        "currentWorkspaceId": "w1",
        "currentAssessmentId": "draft-1",
        "currentAssessment": {"id": "draft-1", "notes": {"2.1": "todo"}}
    });
    let state = hydrate(Some(&blob), &options());
    assert_eq!(state.current_assessment.id.as_str(), "draft-1");
    assert_eq!(state.current_assessment.notes["2.1"], "todo");
}

#[test]
fn duplicate_ids_are_pruned_keeping_first() {
    let blob = json!({
        "workspaces": [
            {"id": "w1", "name": "First", "assessments": [{"id": "a"}, {"id": "a", "answers": {"q": "x"}}]},
            {"id": "w1", "name": "Second"}
        ]
    });
    let state = hydrate(Some(&blob), &options());
    assert_eq!(state.workspaces.len(), 1);
    assert_eq!(state.workspaces[0].name, "First");
    assert_eq!(state.workspaces[0].assessments.len(), 1);
    assert!(state.workspaces[0].assessments[0].answers.is_empty());
}

#[test]
fn api_key_is_dropped_on_load() {
    let blob = json!({"workspaces": [], "apiKey": "xai-123", "model": "custom"});
    let state = hydrate(Some(&blob), &options());
    assert!(state.ai.api_key.is_empty());
    assert_eq!(state.ai.model, "custom");
}

#[test]
fn synthesized_timestamps_use_supplied_clock() {
    let now = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
    let blob = json!({"workspaces": [{"id": "w1", "updatedAt": "2024-01-01T00:00:00Z"}, {"id": "w2"}]});
    let state = hydrate_at(Some(&blob), &options(), now);
    assert_eq!(state.workspaces[0].created_at, state.workspaces[0].updated_at);
    assert_eq!(state.workspaces[1].created_at, now);
}

#[test]
fn import_accepts_export_wrapper_and_bare_object() {
    let wrapped = r#"{"schemaVersion":2,"exportedAt":"2024-01-01T00:00:00Z","assessment":{"id":"x","answers":{"q":"v"}}}"#;
    assert_eq!(import_assessment(wrapped, &options()).unwrap().id.as_str(), "x");

    let bare = r#"{"id":"y"}"#;
    assert_eq!(import_assessment(bare, &options()).unwrap().id.as_str(), "y");

    assert!(import_assessment("[1]", &options()).is_err());
    assert!(import_assessment("nope", &options()).is_err());
}

fn arb_assessment() -> impl Strategy<Value = Value> {
    (
        prop::sample::select(vec![json!("a1"), json!("a2"), json!(""), json!(7), Value::Null]),
        prop::collection::btree_map("q[1-4]", prop_oneof![Just(json!("Managed")), Just(json!(3))], 0..3),
        prop::sample::select(vec![
            Value::Null,
            json!("2024-01-01T00:00:00Z"),
            json!("2024-06-01T08:30:00.123Z"),
            json!("not a date"),
        ]),
        prop::sample::select(vec![
            Value::Null,
            json!({"name": "Acme"}),
            json!({"budget": 1000, "objectives": ["x", 1]}),
            json!("junk"),
        ]),
        prop::sample::select(vec![
            Value::Null,
            json!({"steps": ["one", "two"]}),
            json!({"raw": "text", "error": "boom"}),
        ]),
    )
        .prop_map(|(id, answers, saved_at, metadata, plan)| {
            json!({
                "id": id,
                "frameworkId": "soc_cmm",
                "answers": answers,
                "savedAt": saved_at,
                "metadata": metadata,
                "actionPlan": plan,
                "aspectRecommendations": {"D::A": "rec"}
            })
        })
}

fn arb_blob() -> impl Strategy<Value = Value> {
    let workspace = (
        prop::sample::select(vec![json!("w1"), json!("w2"), Value::Null]),
        prop::collection::vec(arb_assessment(), 0..3),
    )
        .prop_map(|(id, assessments)| json!({"id": id, "name": "Team", "assessments": assessments}));

    prop_oneof![
        Just(Value::Null),
        Just(json!(42)),
        arb_assessment(),
        (
            prop::option::of(arb_assessment()),
            prop::collection::vec(arb_assessment(), 0..3)
        )
            .prop_map(|(current, history)| json!({
                "currentAssessment": current,
                "assessmentHistory": history
            })),
        (
            prop::collection::vec(workspace, 0..3),
            prop::sample::select(vec![json!("w1"), json!("gone"), Value::Null]),
            prop::sample::select(vec![json!("a1"), json!("a2"), Value::Null]),
            prop::option::of(arb_assessment()),
        )
            .prop_map(|(workspaces, ws_id, a_id, current)| json!({
                "workspaces": workspaces,
                "currentWorkspaceId": ws_id,
                "currentAssessmentId": a_id,
                "currentAssessment": current,
                "activeAspectKey": "D::A",
                "sidebarDomainCollapsed": {"D": true}
            })),
    ]
}

proptest! {
    #[test]
    fn prop_hydration_is_idempotent(blob in arb_blob()) {
        let first = hydrate(Some(&blob), &options());
        let second = hydrate(Some(&dehydrate(&first)), &options());
        prop_assert_eq!(&first, &second);

        prop_assert!(!first.workspaces.is_empty());
        let pointer = first.current_workspace_id.as_ref();
        prop_assert!(pointer.is_some_and(|id| first.workspaces.iter().any(|w| &w.id == id)));
        prop_assert!(first.ai.api_key.is_empty());
        prop_assert!(!first.skip_next_auto_save);
    }
}
