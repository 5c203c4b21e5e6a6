//! Behavior of the in-memory persistence service

use soc_model::{ActionPatch, ActionStatus, Assessment, Metadata, NewAction, NewWorkspace};
use soc_store::{RemoteClient, RemoteErrorKind};
use soc_test_utils::{sample_framework, InMemoryRemote, RemoteOp, SAMPLE_FRAMEWORK};

#[tokio::test]
async fn injected_failure_fires_once() {
    let remote = InMemoryRemote::new();
    remote.fail_next(RemoteOp::CreateWorkspace, RemoteErrorKind::Conflict);

    let first = remote
        .create_workspace(NewWorkspace { name: "A".into() })
        .await
        .unwrap_err();
    assert_eq!(first.kind, RemoteErrorKind::Conflict);

    let created = remote
        .create_workspace(NewWorkspace { name: "A".into() })
        .await
        .unwrap();
    assert_eq!(created.id.as_str(), "ws-1");
    assert_eq!(remote.call_count(RemoteOp::CreateWorkspace), 2);
}

#[tokio::test]
async fn assessments_and_actions_round_trip() {
    let remote = InMemoryRemote::new();
    let workspace = remote
        .create_workspace(NewWorkspace { name: "Acme".into() })
        .await
        .unwrap();
    let draft = Assessment::draft(SAMPLE_FRAMEWORK, Metadata::default());
    let saved = remote.create_assessment(&workspace.id, draft.clone()).await.unwrap();
    assert_eq!(saved.id, draft.id);

    let action = remote
        .create_action(NewAction::new(saved.id.clone(), "Enable MFA"))
        .await
        .unwrap();
    assert_eq!(action.workspace_id, workspace.id);

    let done = remote
        .update_action(&action.id, ActionPatch::status(ActionStatus::Done))
        .await
        .unwrap();
    assert_eq!(done.status, ActionStatus::Done);

    remote.delete_assessment(&saved.id).await.unwrap();
    assert!(remote.actions().is_empty());
    assert!(remote.list_assessments(&workspace.id).await.unwrap().is_empty());
}

#[test]
fn sample_framework_shape() {
    let framework = sample_framework();
    let keys: Vec<String> = framework.aspects.iter().map(soc_model::Aspect::key).collect();
    assert_eq!(keys, ["D1::A1", "D1::A2", "D2::A3"]);
}
