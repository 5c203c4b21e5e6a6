//! End-to-end optimistic sync against the in-memory remote

use pretty_assertions::assert_eq;
use soc_model::{
    ActionPatch, ActionStatus, Assessment, AssessmentId, Metadata, NewAction, Workspace,
    WorkspaceId,
};
use soc_store::{AssessmentStore, AutoSaver, RemoteErrorKind, SaveOutcome, SkipReason, TxState};
use soc_test_utils::{setup_store, InMemoryRemote, RemoteOp, StubAi, SAMPLE_FRAMEWORK};
use std::sync::Arc;
use std::time::Duration;

fn seeded_remote(assessments: usize) -> InMemoryRemote {
    let now = chrono::Utc::now();
    let mut workspace = Workspace::new(WorkspaceId::new("ws-acme"), "Acme", now);
    for i in 0..assessments {
        let mut assessment = Assessment::draft(SAMPLE_FRAMEWORK, Metadata::default());
        assessment.id = AssessmentId::new(format!("asm-{i}"));
        assessment.answers.insert("1.1".into(), "Managed".into());
        assessment.saved_at = Some(now + chrono::Duration::seconds(i64::try_from(i).unwrap()));
        workspace.assessments.push(assessment);
    }
    InMemoryRemote::new().with_workspace(workspace)
}

async fn connected(remote: InMemoryRemote) -> (AssessmentStore, Arc<InMemoryRemote>) {
    let remote = Arc::new(remote);
    let store = setup_store(remote.clone(), Arc::new(StubAi::new()));
    store.fetch_workspaces().await.unwrap();
    (store, remote)
}

#[tokio::test]
async fn fetch_enters_first_workspace_and_most_recent_assessment() {
    let (store, _) = connected(seeded_remote(3)).await;
    let state = store.snapshot();
    assert_eq!(state.current_workspace_id, Some(WorkspaceId::new("ws-acme")));
    assert_eq!(state.current_assessment.id.as_str(), "asm-2");
    assert!(state.skip_next_auto_save);
}

#[tokio::test]
async fn rejected_workspace_create_reverts_pointer() {
    let (store, remote) = connected(seeded_remote(1)).await;
    let prior = store.current_workspace_id();
    remote.fail_next(RemoteOp::CreateWorkspace, RemoteErrorKind::Validation);

    let pending = store.begin_create_workspace("Globex").unwrap();
    assert_eq!(pending.state(), TxState::Applied);
    let temp = pending.temp_id().clone();
    assert!(store.workspaces().iter().any(|w| w.id == temp));
    assert_eq!(store.current_workspace_id(), Some(temp.clone()));

    let err = store.settle_create_workspace(pending).await.unwrap_err();
    assert!(err.is_remote());
    assert!(store.workspaces().iter().all(|w| w.id != temp));
    assert_eq!(store.current_workspace_id(), prior);
}

#[tokio::test]
async fn draft_in_pending_workspace_is_saved_after_confirmation() {
    let (store, remote) = connected(seeded_remote(0)).await;
    assert_eq!(
        store.auto_save().await.unwrap(),
        SaveOutcome::Skipped(SkipReason::SuppressedOnce)
    );
    let pending = store.begin_create_workspace("Globex").unwrap();
    store.set_answer("1.1", "Defined");

    assert_eq!(
        store.auto_save().await.unwrap(),
        SaveOutcome::Skipped(SkipReason::PendingWorkspace)
    );
    let created = store.settle_create_workspace(pending).await.unwrap();
    assert_eq!(store.current_workspace_id(), Some(created.id.clone()));

    assert!(matches!(store.auto_save().await.unwrap(), SaveOutcome::Created(_)));
    let server = remote.workspaces();
    let globex = server.iter().find(|w| w.id == created.id).unwrap();
    assert_eq!(globex.assessments.len(), 1);
}

#[tokio::test]
async fn delete_rollback_restores_original_index() {
    let (store, remote) = connected(seeded_remote(5)).await;
    let before: Vec<_> = store.workspaces()[0]
        .assessments
        .iter()
        .map(|a| a.id.clone())
        .collect();
    remote.fail_next(RemoteOp::DeleteAssessment, RemoteErrorKind::Transport);

    let target = AssessmentId::new("asm-2");
    let pending = store.begin_delete_assessment(&target).unwrap();
    assert_eq!(pending.index(), 2);
    assert_eq!(store.workspaces()[0].assessments.len(), 4);

    assert!(store.settle_delete_assessment(pending).await.is_err());
    let after: Vec<_> = store.workspaces()[0]
        .assessments
        .iter()
        .map(|a| a.id.clone())
        .collect();
    assert_eq!(after, before);
}

#[tokio::test]
async fn worth_saving_gate_protects_collection() {
    let (store, remote) = connected(seeded_remote(0)).await;
    store.start_assessment(None).unwrap();
    assert_eq!(
        store.auto_save().await.unwrap(),
        SaveOutcome::Skipped(SkipReason::SuppressedOnce)
    );
    assert_eq!(
        store.auto_save().await.unwrap(),
        SaveOutcome::Skipped(SkipReason::NothingToPersist)
    );
    assert_eq!(remote.call_count(RemoteOp::CreateAssessment), 0);
    assert!(store.workspaces()[0].assessments.is_empty());
}

#[tokio::test]
async fn duplicate_ids_from_the_remote_keep_the_first_copy() {
    let now = chrono::Utc::now();
    let mut workspace = Workspace::new(WorkspaceId::new("ws-acme"), "Acme", now);
    for answer in ["Managed", "Initial"] {
        let mut assessment = Assessment::draft(SAMPLE_FRAMEWORK, Metadata::default());
        assessment.id = AssessmentId::new("asm-dup");
        assessment.answers.insert("1.1".into(), answer.into());
        workspace.assessments.push(assessment);
    }
    let stale = Workspace::new(WorkspaceId::new("ws-acme"), "Acme (stale)", now);
    let remote = InMemoryRemote::new()
        .with_workspace(workspace)
        .with_workspace(stale);
    let (store, _) = connected(remote).await;

    let workspaces = store.workspaces();
    assert_eq!(workspaces.len(), 1);
    assert_eq!(workspaces[0].name, "Acme");
    assert_eq!(workspaces[0].assessments.len(), 1);
    assert_eq!(workspaces[0].assessments[0].answers["1.1"], "Managed");

    let listed = store
        .fetch_assessments(&WorkspaceId::new("ws-acme"))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].answers["1.1"], "Managed");
    let state = store.snapshot();
    assert_eq!(state.workspaces[0].assessments.len(), 1);
    assert_eq!(state.workspaces[0].assessments[0].answers["1.1"], "Managed");
}

#[tokio::test]
async fn save_during_in_flight_create_is_deferred() {
    let (store, remote) = connected(seeded_remote(0)).await;
    store.set_answer("1.1", "Defined");
    let gate = remote.hold_next(RemoteOp::CreateAssessment);

    let first = tokio::spawn({
        let store = store.clone();
        async move { store.save_current().await }
    });
    while store.snapshot().pending_creates.is_empty() {
        tokio::task::yield_now().await;
    }

    assert_eq!(
        store.save_current().await.unwrap(),
        SaveOutcome::Skipped(SkipReason::PendingCreate)
    );
    store.set_answer("1.2", "Managed");
    assert_eq!(
        store.auto_save().await.unwrap(),
        SaveOutcome::Skipped(SkipReason::PendingCreate)
    );

    gate.notify_one();
    assert!(matches!(first.await.unwrap().unwrap(), SaveOutcome::Created(_)));
    assert!(store.snapshot().pending_creates.is_empty());
    assert_eq!(remote.call_count(RemoteOp::UpdateAssessment), 0);

    assert!(matches!(store.auto_save().await.unwrap(), SaveOutcome::Updated(_)));
    let server = remote.workspaces();
    assert_eq!(server[0].assessments.len(), 1);
    assert_eq!(server[0].assessments[0].answers["1.2"], "Managed");
}

#[tokio::test(start_paused = true)]
async fn first_edit_after_load_is_auto_saved() {
    let (store, remote) = connected(seeded_remote(2)).await;
    let saver = AutoSaver::spawn(store.clone());
    let target = AssessmentId::new("asm-0");

    assert!(store.load_assessment(&target));
    store.set_answer("1.1", "Defined");
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(remote.call_count(RemoteOp::UpdateAssessment), 1);
    let server = remote.workspaces();
    assert_eq!(server[0].assessment(&target).unwrap().answers["1.1"], "Defined");
    saver.stop();
}

#[tokio::test(start_paused = true)]
async fn load_alone_writes_nothing_and_next_edit_is_saved() {
    let (store, remote) = connected(seeded_remote(2)).await;
    let saver = AutoSaver::spawn(store.clone());
    let target = AssessmentId::new("asm-0");

    assert!(store.load_assessment(&target));
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(remote.call_count(RemoteOp::UpdateAssessment), 0);
    assert!(!store.snapshot().skip_next_auto_save);

    store.set_answer("1.2", "Optimized");
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(remote.call_count(RemoteOp::UpdateAssessment), 1);
    let server = remote.workspaces();
    assert_eq!(server[0].assessment(&target).unwrap().answers["1.2"], "Optimized");
    saver.stop();
}

#[tokio::test]
async fn action_lifecycle() {
    let (store, remote) = connected(seeded_remote(1)).await;
    let assessment = AssessmentId::new("asm-0");

    let created = store
        .create_action(NewAction::new(assessment.clone(), "Document escalation paths"))
        .await
        .unwrap();
    assert_eq!(created.workspace_id.as_str(), "ws-acme");
    assert_eq!(store.actions(&assessment), vec![created.clone()]);

    let updated = store
        .update_action(&created.id, ActionPatch::status(ActionStatus::Doing))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, ActionStatus::Doing);
    assert_eq!(store.actions(&assessment)[0].status, ActionStatus::Doing);

    remote.fail_next(RemoteOp::DeleteAction, RemoteErrorKind::Transport);
    assert!(store.delete_action(&created.id).await.is_err());
    assert_eq!(store.actions(&assessment).len(), 1);

    assert!(store.delete_action(&created.id).await.unwrap());
    assert!(store.actions(&assessment).is_empty());
    assert!(remote.actions().is_empty());
}

#[tokio::test]
async fn deleting_last_workspace_leaves_no_pointer() {
    let (store, _) = connected(seeded_remote(1)).await;
    assert!(store.delete_workspace(&WorkspaceId::new("ws-acme")).await.unwrap());

    let state = store.snapshot();
    assert!(state.workspaces.is_empty());
    assert_eq!(state.current_workspace_id, None);
    assert_eq!(
        store.auto_save().await.unwrap(),
        SaveOutcome::Skipped(SkipReason::SuppressedOnce)
    );
    assert_eq!(
        store.auto_save().await.unwrap(),
        SaveOutcome::Skipped(SkipReason::NoWorkspace)
    );
}
