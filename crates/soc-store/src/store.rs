//! The state container
//!
//! [`AssessmentStore`] is a cheap, cloneable handle over one [`AppState`].
//! Synchronous accessors and mutators live here; the remote-backed
//! operations live in [`crate::coordinator`].
//!
//! The state lock is only ever taken inside a closure and never across an
//! `.await`, so each synchronous phase is atomic with respect to every other.

use crate::ai::ActionPlanGenerator;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::remote::RemoteClient;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use soc_hydrate::{AssessmentExport, MigrationPayload, WorkspaceExport};
use soc_model::{
    Action, ActionPlan, AiSettings, AppState, Assessment, AssessmentId, Framework,
    FrameworkCatalog, MetadataPatch, Recommendation, Theme, UiFlags, Workspace, WorkspaceId,
};
use soc_scoring::{compute_scores, domain_progress, DomainProgress, Scores};
use std::sync::Arc;
use tokio::sync::watch;

struct Inner {
    state: Mutex<AppState>,
    remote: Arc<dyn RemoteClient>,
    ai: Arc<dyn ActionPlanGenerator>,
    catalog: FrameworkCatalog,
    config: StoreConfig,
    revision: watch::Sender<u64>,
}

/// Shared handle to the application state
#[derive(Clone)]
pub struct AssessmentStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AssessmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentStore")
            .field("config", &self.inner.config)
            .field("revision", &*self.inner.revision.borrow())
            .finish_non_exhaustive()
    }
}

impl AssessmentStore {
    /// Store over a fresh default state
    #[must_use]
    pub fn new(
        config: StoreConfig,
        catalog: FrameworkCatalog,
        remote: Arc<dyn RemoteClient>,
        ai: Arc<dyn ActionPlanGenerator>,
    ) -> Self {
        Self::from_persisted(config, catalog, remote, ai, None)
    }

    /// Store over a hydrated persisted blob
    #[must_use]
    pub fn from_persisted(
        config: StoreConfig,
        catalog: FrameworkCatalog,
        remote: Arc<dyn RemoteClient>,
        ai: Arc<dyn ActionPlanGenerator>,
        blob: Option<&Value>,
    ) -> Self {
        let state = soc_hydrate::hydrate(blob, &config.hydrate_options());
        let (revision, _) = watch::channel(0);
        tracing::info!(
            workspaces = state.workspaces.len(),
            frameworks = catalog.ids().count(),
            "assessment store ready"
        );
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                remote,
                ai,
                catalog,
                config,
                revision,
            }),
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Known frameworks
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &FrameworkCatalog {
        &self.inner.catalog
    }

    pub(crate) fn remote(&self) -> &dyn RemoteClient {
        self.inner.remote.as_ref()
    }

    pub(crate) fn generator(&self) -> &dyn ActionPlanGenerator {
        self.inner.ai.as_ref()
    }

    /// Watch the current-assessment revision counter
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Current revision of the current assessment
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.inner.state.lock())
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        f(&mut self.inner.state.lock())
    }

    /// Mutate the current assessment and announce the edit
    ///
    /// An edit cancels a pending auto-save suppression: the write is no
    /// longer redundant with what was just loaded.
    fn edit_current<R>(&self, f: impl FnOnce(&mut Assessment) -> R) -> R {
        let result = self.write(|s| {
            s.skip_next_auto_save = false;
            f(&mut s.current_assessment)
        });
        self.bump();
        result
    }

    /// Announce that navigation replaced the current assessment
    ///
    /// The auto-save pass this schedules consumes the suppression flag set
    /// by the load, so the first edit afterwards is saved.
    pub(crate) fn announce_load(&self) {
        self.bump();
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    pub(crate) fn framework(&self, id: &str) -> Result<&Framework, StoreError> {
        self.inner
            .catalog
            .get(id)
            .ok_or_else(|| StoreError::UnknownFramework(id.to_string()))
    }

    // Reads

    /// Reconciled copy of the whole state
    ///
    /// Duplicate ids that slipped in through overlapping fetches are pruned
    /// here, keeping first occurrences.
    #[must_use]
    pub fn snapshot(&self) -> AppState {
        self.write(|s| {
            s.reconcile();
            s.clone()
        })
    }

    /// Assessment in the editing surface
    #[must_use]
    pub fn current_assessment(&self) -> Assessment {
        self.read(|s| s.current_assessment.clone())
    }

    /// Current workspace pointer
    #[must_use]
    pub fn current_workspace_id(&self) -> Option<WorkspaceId> {
        self.read(|s| s.current_workspace_id.clone())
    }

    /// All workspaces, reconciled
    #[must_use]
    pub fn workspaces(&self) -> Vec<Workspace> {
        self.write(|s| {
            s.reconcile();
            s.workspaces.clone()
        })
    }

    /// Cached actions of one assessment
    #[must_use]
    pub fn actions(&self, assessment_id: &AssessmentId) -> Vec<Action> {
        self.read(|s| {
            s.actions_by_assessment_id
                .get(assessment_id)
                .cloned()
                .unwrap_or_default()
        })
    }

    /// Generative-text settings
    #[must_use]
    pub fn ai_settings(&self) -> AiSettings {
        self.read(|s| s.ai.clone())
    }

    /// Sidebar flags
    #[must_use]
    pub fn ui(&self) -> UiFlags {
        self.read(|s| s.ui.clone())
    }

    /// Scores of the current assessment
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownFramework`] when its framework is not loaded.
    pub fn scores(&self) -> Result<Scores, StoreError> {
        let (framework_id, answers) = self.read(|s| {
            let current = &s.current_assessment;
            (current.framework_id.clone(), current.answers.clone())
        });
        Ok(compute_scores(self.framework(&framework_id)?, &answers))
    }

    /// Completion per domain of the current assessment
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownFramework`] when its framework is not loaded.
    pub fn progress(&self) -> Result<Vec<DomainProgress>, StoreError> {
        let (framework_id, answers) = self.read(|s| {
            let current = &s.current_assessment;
            (current.framework_id.clone(), current.answers.clone())
        });
        Ok(domain_progress(self.framework(&framework_id)?, &answers))
    }

    // Current assessment edits

    /// Record an answer
    pub fn set_answer(&self, code: impl Into<String>, value: impl Into<String>) {
        let (code, value) = (code.into(), value.into());
        self.edit_current(|a| a.answers.insert(code, value));
    }

    /// Record a note
    pub fn set_note(&self, code: impl Into<String>, value: impl Into<String>) {
        let (code, value) = (code.into(), value.into());
        self.edit_current(|a| a.notes.insert(code, value));
    }

    /// Operating-model current state
    pub fn set_soctom_current_state(&self, code: &str, text: impl Into<String>) {
        let text = text.into();
        self.edit_current(|a| a.soctom_entry_mut(code).current_state = text);
    }

    /// Operating-model target state
    pub fn set_soctom_target_state(&self, code: &str, text: impl Into<String>) {
        let text = text.into();
        self.edit_current(|a| a.soctom_entry_mut(code).target_state = text);
    }

    /// Exclude or include a question in improvement planning
    pub fn set_soctom_skip_improvement(&self, code: &str, skip: bool) {
        self.edit_current(|a| a.soctom_entry_mut(code).skip_improvement = skip);
    }

    /// Merge metadata fields
    pub fn set_metadata(&self, patch: MetadataPatch) {
        self.edit_current(|a| a.metadata.apply(patch));
    }

    /// Report language
    pub fn set_language(&self, language: impl Into<String>) {
        self.set_metadata(MetadataPatch::language(language));
    }

    /// Switch framework, dropping framework-bound content but not metadata
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownFramework`] when the id is not in the catalog.
    pub fn set_framework(&self, framework_id: &str) -> Result<(), StoreError> {
        self.framework(framework_id)?;
        self.write(|s| s.active_aspect_key = None);
        self.edit_current(|a| a.reset_framework_content(framework_id));
        Ok(())
    }

    /// Store a plan
    pub fn set_action_plan(&self, plan: ActionPlan) {
        self.edit_current(|a| a.action_plan = plan);
    }

    /// Store a recommendation for one aspect
    pub fn set_aspect_recommendation(
        &self,
        aspect_key: impl Into<String>,
        text: impl Into<String>,
    ) {
        let recommendation = Recommendation {
            text: text.into(),
            generated_at: Some(Utc::now()),
        };
        let key = aspect_key.into();
        self.edit_current(|a| a.aspect_recommendations.insert(key, recommendation));
    }

    /// Drop the recommendation for one aspect
    pub fn clear_aspect_recommendation(&self, aspect_key: &str) {
        self.edit_current(|a| a.aspect_recommendations.remove(aspect_key));
    }

    // Navigation and settings

    /// Template for the next new draft
    pub fn set_upcoming_metadata(&self, patch: MetadataPatch) {
        self.write(|s| s.upcoming_metadata.apply(patch));
    }

    /// Select an aspect; `None` selects the first aspect
    pub fn set_active_aspect_key(&self, key: Option<String>) {
        self.write(|s| s.active_aspect_key = key);
    }

    /// Collapse or expand the sidebar
    pub fn set_sidebar_collapsed(&self, collapsed: bool) {
        self.write(|s| s.ui.sidebar_collapsed = collapsed);
    }

    /// Flip the sidebar, returning the new value
    pub fn toggle_sidebar(&self) -> bool {
        self.write(|s| {
            s.ui.sidebar_collapsed = !s.ui.sidebar_collapsed;
            s.ui.sidebar_collapsed
        })
    }

    /// Collapse or expand the assessment section
    pub fn set_assessment_section_collapsed(&self, collapsed: bool) {
        self.write(|s| s.ui.sidebar_assessment_collapsed = collapsed);
    }

    /// Collapse or expand the administration section
    pub fn set_administration_section_collapsed(&self, collapsed: bool) {
        self.write(|s| s.ui.sidebar_administration_collapsed = collapsed);
    }

    /// Collapse or expand one domain
    pub fn set_domain_collapsed(&self, domain: impl Into<String>, collapsed: bool) {
        let domain = domain.into();
        self.write(|s| s.ui.sidebar_domain_collapsed.insert(domain, collapsed));
    }

    /// Color scheme
    pub fn set_theme(&self, theme: Theme) {
        self.write(|s| s.theme = theme);
    }

    /// Replace generative-text settings
    pub fn set_ai_settings(&self, settings: AiSettings) {
        self.write(|s| s.ai = settings);
    }

    /// Set only the in-memory API key
    pub fn set_api_key(&self, key: impl Into<String>) {
        let key = key.into();
        self.write(|s| s.ai.api_key = key);
    }

    // Lifecycle

    /// Begin a new draft from the upcoming-metadata template
    ///
    /// The draft is not persisted until it carries content.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownFramework`] when the framework is not loaded.
    pub fn start_assessment(&self, framework_id: Option<&str>) -> Result<AssessmentId, StoreError> {
        let framework_id = framework_id.unwrap_or(&self.inner.config.default_framework_id);
        self.framework(framework_id)?;
        let id = self.write(|s| {
            s.current_assessment = s.new_draft(framework_id);
            s.active_aspect_key = None;
            s.skip_next_auto_save = true;
            s.current_assessment.id.clone()
        });
        self.announce_load();
        tracing::info!(assessment = %id, framework = framework_id, "started new assessment");
        Ok(id)
    }

    /// Make a saved assessment current
    ///
    /// Looks in the current workspace first, then all others (moving the
    /// workspace pointer). Returns `false` and changes nothing when the id
    /// does not resolve.
    pub fn load_assessment(&self, id: &AssessmentId) -> bool {
        let loaded = self.write(|s| {
            let found = s
                .current_workspace()
                .filter(|w| w.contains(id))
                .or_else(|| s.workspace_of(id))
                .and_then(|w| Some((w.id.clone(), w.assessment(id)?.clone())));
            let Some((workspace_id, assessment)) = found else {
                return false;
            };
            s.current_workspace_id = Some(workspace_id);
            s.current_assessment = assessment;
            s.active_aspect_key = None;
            s.skip_next_auto_save = true;
            true
        });
        if loaded {
            self.announce_load();
        } else {
            tracing::debug!(assessment = %id, "load ignored, assessment not found");
        }
        loaded
    }

    /// Point at another workspace and load its most recent assessment
    ///
    /// Returns `false` and changes nothing for an unknown id.
    pub fn switch_workspace(&self, id: &WorkspaceId) -> bool {
        let default_framework = self.inner.config.default_framework_id.clone();
        let switched = self.write(|s| {
            if s.workspace(id).is_none() {
                return false;
            }
            s.enter_workspace(Some(id.clone()), &default_framework);
            s.skip_next_auto_save = true;
            true
        });
        if switched {
            self.announce_load();
        }
        switched
    }

    /// Replace the whole state from a persisted blob, keeping the API key
    pub fn import_state(&self, blob: Option<&Value>) {
        let mut next = soc_hydrate::hydrate(blob, &self.inner.config.hydrate_options());
        self.write(|s| {
            next.ai.api_key = std::mem::take(&mut s.ai.api_key);
            next.pending_creates = std::mem::take(&mut s.pending_creates);
            next.skip_next_auto_save = true;
            *s = next;
        });
        self.announce_load();
        tracing::info!("state replaced from import");
    }

    /// Return to a fresh default state
    pub fn reset(&self) {
        self.write(|s| *s = soc_hydrate::hydrate(None, &self.inner.config.hydrate_options()));
        tracing::info!("state reset");
    }

    /// Read an exported assessment and make it the current draft
    ///
    /// A colliding id is replaced so the import never overwrites a saved
    /// assessment.
    ///
    /// # Errors
    ///
    /// [`StoreError::Import`] for unreadable documents and
    /// [`StoreError::UnknownFramework`] for frameworks not loaded.
    pub fn import_assessment(&self, text: &str) -> Result<AssessmentId, StoreError> {
        let options = self.inner.config.hydrate_options();
        let mut assessment = soc_hydrate::import_assessment(text, &options)?;
        self.framework(&assessment.framework_id)?;
        assessment.saved_at = None;

        let id = self.write(|s| {
            let taken = s.workspace_of(&assessment.id).is_some()
                || s.current_assessment.id == assessment.id;
            if taken {
                assessment.id = AssessmentId::generate();
            }
            let id = assessment.id.clone();
            s.current_assessment = assessment;
            s.active_aspect_key = None;
            id
        });
        self.bump();
        Ok(id)
    }

    // Persistence projections

    /// Persistable projection of the state
    #[must_use]
    pub fn dehydrate(&self) -> Value {
        self.read(soc_hydrate::dehydrate)
    }

    /// Export a saved assessment, or the current one
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the id does not resolve.
    pub fn export_assessment(
        &self,
        id: Option<&AssessmentId>,
    ) -> Result<AssessmentExport, StoreError> {
        self.read(|s| {
            let assessment = match id {
                None => Some(&s.current_assessment),
                Some(id) if *id == s.current_assessment.id => Some(&s.current_assessment),
                Some(id) => s.workspace_of(id).and_then(|w| w.assessment(id)),
            };
            assessment
                .map(|a| soc_hydrate::export_assessment(a, Utc::now()))
                .ok_or_else(|| StoreError::NotFound {
                    entity: "assessment",
                    id: id.map(ToString::to_string).unwrap_or_default(),
                })
        })
    }

    /// Export a workspace, or the current one
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the id does not resolve.
    pub fn export_workspace(
        &self,
        id: Option<&WorkspaceId>,
    ) -> Result<WorkspaceExport, StoreError> {
        self.read(|s| {
            let workspace = match id {
                Some(id) => s.workspace(id),
                None => s.current_workspace(),
            };
            workspace
                .map(|w| soc_hydrate::export_workspace(w, Utc::now()))
                .ok_or_else(|| StoreError::NotFound {
                    entity: "workspace",
                    id: id.map(ToString::to_string).unwrap_or_default(),
                })
        })
    }

    /// Local workspaces in bulk-import form
    #[must_use]
    pub fn migration_payload(&self) -> MigrationPayload {
        self.read(soc_hydrate::migration_payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockActionPlanGenerator;
    use crate::remote::MockRemoteClient;
    use soc_model::Metadata;

    fn catalog() -> FrameworkCatalog {
        let tree = r#"{"tree":{"Business":{"Governance":[
            {"code":"1.1","text":"Charter?","answer_options":["No","Partially","Yes"]},
            {"code":"1.2","text":"Budget?","answer_options":["No","Yes"]}
        ]}}}"#;
        FrameworkCatalog::new()
            .with(Framework::from_tree_json("soc_cmm", "SOC-CMM", tree).unwrap())
            .with(Framework::from_tree_json("sim3", "SIM3", tree).unwrap())
    }

    fn store() -> AssessmentStore {
        AssessmentStore::new(
            StoreConfig::default(),
            catalog(),
            Arc::new(MockRemoteClient::new()),
            Arc::new(MockActionPlanGenerator::new()),
        )
    }

    #[test]
    fn edits_bump_revision_but_ui_settings_do_not() {
        let store = store();
        let before = store.revision();
        store.set_answer("1.1", "Yes");
        store.set_note("1.1", "charter signed");
        assert_eq!(store.revision(), before + 2);

        store.set_active_aspect_key(Some("Business::Governance".into()));
        store.toggle_sidebar();
        store.set_theme(Theme::Dark);
        assert_eq!(store.revision(), before + 2);
    }

    #[test]
    fn loads_schedule_a_pass_and_edits_cancel_suppression() {
        let store = store();
        let before = store.revision();
        store.start_assessment(None).unwrap();
        assert_eq!(store.revision(), before + 1);
        assert!(store.snapshot().skip_next_auto_save);

        store.set_answer("1.1", "Yes");
        assert_eq!(store.revision(), before + 2);
        assert!(!store.snapshot().skip_next_auto_save);
    }

    #[test]
    fn framework_switch_keeps_metadata() {
        let store = store();
        store.set_metadata(MetadataPatch::name("Acme"));
        store.set_answer("1.1", "Yes");
        store.set_active_aspect_key(Some("Business::Governance".into()));

        store.set_framework("sim3").unwrap();
        let current = store.current_assessment();
        assert_eq!(current.framework_id, "sim3");
        assert!(current.answers.is_empty());
        assert_eq!(current.metadata.name, "Acme");
        assert_eq!(store.snapshot().active_aspect_key, None);
    }

    #[test]
    fn unknown_framework_is_rejected() {
        let store = store();
        let err = store.set_framework("nope").unwrap_err();
        assert!(matches!(err, StoreError::UnknownFramework(_)));
        assert_eq!(store.current_assessment().framework_id, "soc_cmm");
    }

    #[test]
    fn start_assessment_uses_template_and_suppresses_save() {
        let store = store();
        store.set_upcoming_metadata(MetadataPatch::name("Next Corp"));
        store.set_active_aspect_key(Some("x".into()));
        let id = store.start_assessment(None).unwrap();

        let s = store.snapshot();
        assert_eq!(s.current_assessment.id, id);
        assert_eq!(s.current_assessment.metadata.name, "Next Corp");
        assert!(s.skip_next_auto_save);
        assert_eq!(s.active_aspect_key, None);
    }

    #[test]
    fn loading_unknown_assessment_is_a_no_op() {
        let store = store();
        let before = store.snapshot();
        assert!(!store.load_assessment(&AssessmentId::new("missing")));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn scores_follow_current_answers() {
        let store = store();
        store.set_answer("1.1", "Yes");
        let scores = store.scores().unwrap();
        assert!((scores.aspect_scores["Business::Governance"] - 3.0).abs() < f64::EPSILON);
        assert_eq!(store.progress().unwrap()[0].answered, 1);
    }

    #[test]
    fn import_state_keeps_in_memory_key() {
        let store = store();
        store.set_api_key("xai-secret");
        store.import_state(Some(&serde_json::json!({"answers": {"1.1": "No"}})));
        let s = store.snapshot();
        assert_eq!(s.ai.api_key, "xai-secret");
        assert_eq!(s.current_assessment.answers["1.1"], "No");
        assert!(!store.dehydrate().to_string().contains("xai-secret"));
    }

    #[test]
    fn imported_assessment_never_reuses_current_id() {
        let store = store();
        let current = store.current_assessment();
        let export = soc_hydrate::export_assessment(&current, Utc::now());
        let text = serde_json::to_string(&export).unwrap();
        let id = store.import_assessment(&text).unwrap();
        assert_ne!(id, current.id);
    }

    #[test]
    fn export_unknown_is_not_found() {
        let store = store();
        assert!(store.export_assessment(Some(&AssessmentId::new("x"))).unwrap_err().is_not_found());
        assert!(store.export_workspace(None).is_ok());
        assert_eq!(store.export_assessment(None).unwrap().assessment.metadata, Metadata::default());
    }
}
