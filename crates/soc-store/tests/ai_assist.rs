//! Plan generation and AI-seeded actions

use soc_model::ActionSource;
use soc_store::{parse_action_plan, AiError, FALLBACK_PLAN, MISSING_KEY_PLAN};
use soc_test_utils::{setup_store, InMemoryRemote, RemoteOp, StubAi};
use std::sync::Arc;

const PLAN: &str = "## BLUF\nDetection coverage is thin.\n\n## Low-Hanging Fruit\n- Enable MFA\n\n## Action Plan\n1. Hire two analysts\n2. Tune SIEM rules";

#[tokio::test]
async fn plan_without_key_never_calls_generator() {
    let ai = Arc::new(StubAi::new().with_plan(PLAN));
    let store = setup_store(Arc::new(InMemoryRemote::new()), ai.clone());

    let plan = store.generate_action_plan().await.unwrap();
    assert_eq!(plan.raw, MISSING_KEY_PLAN);
    assert!(ai.prompts().is_empty());
}

#[tokio::test]
async fn generated_plan_is_stored_and_sectioned() {
    let ai = Arc::new(StubAi::new().with_plan(PLAN));
    let store = setup_store(Arc::new(InMemoryRemote::new()), ai.clone());
    store.set_api_key("xai-test");
    store.set_answer("1.1", "Defined");

    store.generate_action_plan().await.unwrap();
    let stored = store.current_assessment().action_plan;
    assert_eq!(stored.raw, PLAN);
    assert!(ai.prompts()[0].user.contains("Sample Framework"));

    let sections = parse_action_plan(&stored.raw);
    assert_eq!(sections.bluf, "Detection coverage is thin.");
    assert_eq!(sections.low_hanging_fruit, "- Enable MFA");
    assert!(sections.action_plan.starts_with("1. Hire"));
}

#[tokio::test]
async fn generator_failure_is_not_propagated() {
    let ai = Arc::new(StubAi::new().failing(AiError::Unauthorized));
    let store = setup_store(Arc::new(InMemoryRemote::new()), ai);
    store.set_api_key("bad-key");

    let plan = store.generate_action_plan().await.unwrap();
    assert_eq!(plan.raw, FALLBACK_PLAN);
    assert_eq!(plan.error.as_deref(), Some("the API key or endpoint was rejected"));
}

#[tokio::test]
async fn seeded_actions_land_in_bucket_and_on_server() {
    let remote = Arc::new(InMemoryRemote::new());
    let ai = Arc::new(StubAi::new().with_actions(["Enable MFA", "Write playbooks"]));
    let store = setup_store(remote.clone(), ai);
    store.set_api_key("xai-test");
    store.fetch_workspaces().await.unwrap();
    store.create_workspace("Acme").await.unwrap();
    store.set_answer("1.1", "Managed");
    store.save_current().await.unwrap();
    let id = store.current_assessment().id;

    let created = store.seed_actions_from_ai(&id).await.unwrap();
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|a| a.source == ActionSource::Ai));
    assert_eq!(store.actions(&id).len(), 2);
    assert_eq!(remote.actions().len(), 2);
    assert_eq!(remote.call_count(RemoteOp::CreateActions), 1);
}
