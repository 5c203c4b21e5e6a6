//! SOC Store - state container and optimistic remote sync
//!
//! The single source of truth for the assessment app:
//! - [`AssessmentStore`], a shared handle over the canonical state
//! - Optimistic create/update/delete against an injected [`RemoteClient`]
//! - Explicit transactions carrying owned rollback snapshots
//! - Debounced auto-save gated by the worth-persisting predicate
//! - Action plan generation through an injected [`ActionPlanGenerator`]
//!
//! # Example
//!
//! ```rust,ignore
//! use soc_store::prelude::*;
//!
//! # async fn example(remote: Arc<dyn RemoteClient>, ai: Arc<dyn ActionPlanGenerator>,
//! #                  catalog: FrameworkCatalog) -> Result<(), StoreError> {
//! let store = AssessmentStore::new(StoreConfig::new(), catalog, remote, ai);
//! let _saver = AutoSaver::spawn(store.clone());
//!
//! store.fetch_workspaces().await?;
//! store.set_answer("1.1", "Yes");
//! println!("maturity {}", store.scores()?.maturity);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod ai;
pub mod autosave;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod plan;
pub mod remote;
pub mod store;
pub mod tx;

pub use ai::{
    build_actions_prompt, build_plan_prompt, normalize_api_base, ActionPlanGenerator, PlanPrompt,
    SuggestedAction, FALLBACK_PLAN, MISSING_KEY_PLAN,
};
pub use autosave::AutoSaver;
pub use config::{AiDefaults, StoreConfig};
pub use coordinator::{
    PendingActionCreate, PendingActionDelete, PendingAssessmentDelete, PendingWorkspaceCreate,
    PendingWorkspaceDelete, SaveMode, SaveOutcome, SkipReason,
};
pub use error::{AiError, RemoteError, RemoteErrorKind, StoreError};
pub use plan::{parse_action_plan, PlanSections};
pub use remote::{ImportSummary, RemoteClient};
pub use store::AssessmentStore;
pub use tx::{Transaction, TxState, Undo};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the store
    pub use crate::{
        ActionPlanGenerator, AssessmentStore, AutoSaver, RemoteClient, SaveOutcome, StoreConfig,
        StoreError,
    };
    pub use soc_model::FrameworkCatalog;
    pub use std::sync::Arc;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
