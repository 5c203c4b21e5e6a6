//! Debounced background auto-save
//!
//! Waits for the current-assessment revision to change (an edit or a load),
//! lets further changes settle for the configured interval, then runs one
//! [`AssessmentStore::auto_save`] pass. The pass after a load consumes the
//! load's suppression flag. Failures are logged and not retried;
//! the next edit schedules another pass.

use crate::coordinator::SaveOutcome;
use crate::store::AssessmentStore;
use tokio::task::JoinHandle;

/// Handle to the auto-save task; dropping it stops the task
#[derive(Debug)]
pub struct AutoSaver {
    handle: JoinHandle<()>,
}

impl AutoSaver {
    /// Start watching `store` on the current runtime
    #[must_use = "dropping the handle stops auto-save"]
    pub fn spawn(store: AssessmentStore) -> Self {
        let debounce = store.config().auto_save_debounce();
        let mut revisions = store.subscribe();

        let handle = tokio::spawn(async move {
            tracing::debug!(debounce_ms = debounce.as_millis(), "auto-save started");
            while revisions.changed().await.is_ok() {
                loop {
                    tokio::select! {
                        changed = revisions.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                        () = tokio::time::sleep(debounce) => break,
                    }
                }

                match store.auto_save().await {
                    Ok(SaveOutcome::Skipped(reason)) => {
                        tracing::debug!(?reason, "auto-save skipped");
                    }
                    Ok(outcome) => tracing::debug!(?outcome, "auto-save written"),
                    Err(error) => tracing::warn!(%error, "auto-save failed"),
                }
            }
        });

        Self { handle }
    }

    /// Whether the task has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the task
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
