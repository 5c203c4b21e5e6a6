//! Optimistic mutation coordinator
//!
//! Remote-backed operations of [`crate::AssessmentStore`], grouped by
//! entity. Each pairs a synchronous local change with one remote call:
//!
//! - create: insert a `temp-` record, swap in the server entity on success,
//!   remove it and restore pointers on failure
//! - update: patch every cached occurrence, surface failures without rollback
//! - delete: remove and snapshot, re-insert at the same index on failure
//!
//! Create and delete expose their two phases (`begin_*` / `settle_*`) so
//! callers can render the optimistic state before the remote answers.

mod actions;
mod assessments;
mod assist;
mod workspaces;

pub use actions::{PendingActionCreate, PendingActionDelete};
pub use assessments::{PendingAssessmentDelete, SaveMode, SaveOutcome, SkipReason};
pub use workspaces::{PendingWorkspaceCreate, PendingWorkspaceDelete};
