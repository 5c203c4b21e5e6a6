//! SOC Model - canonical in-memory schema
//!
//! Defines the single shape every other layer works against:
//! - Identifier newtypes with temporary (optimistic) id detection
//! - Workspaces owning versioned assessments
//! - Assessment metadata with its default template
//! - Remediation actions and their patches
//! - Questionnaire framework taxonomies (domain -> aspect -> question)
//! - [`AppState`], the full state held by the store
//!
//! # Example
//!
//! ```rust
//! use soc_model::{Assessment, Metadata, is_worth_persisting};
//!
//! let draft = Assessment::draft("soc_cmm", Metadata::default());
//! assert!(!is_worth_persisting(&draft, false));
//! assert!(is_worth_persisting(&draft, true));
//! ```

#![allow(missing_docs)]
#![warn(unreachable_pub)]

pub mod action;
pub mod assessment;
pub mod collection;
pub mod error;
pub mod framework;
pub mod ids;
pub mod metadata;
pub mod state;
pub mod workspace;

pub use action::{
    sort_actions, Action, ActionPatch, ActionPriority, ActionSource, ActionStatus, NewAction,
    MAX_TITLE_LEN,
};
pub use assessment::{
    is_worth_persisting, ActionPlan, AspectKey, Assessment, QuestionCode, Recommendation,
    SoctomEntry,
};
pub use collection::{dedupe_by_key, insert_clamped};
pub use error::ModelError;
pub use framework::{Aspect, Framework, FrameworkCatalog, Question};
pub use ids::{ActionId, AssessmentId, WorkspaceId, TEMP_PREFIX};
pub use metadata::{Metadata, MetadataPatch};
pub use state::{AiSettings, AppState, Theme, UiFlags};
pub use workspace::{NewWorkspace, Upsert, Workspace, WorkspacePatch};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
