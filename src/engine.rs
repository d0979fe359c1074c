//! ContextEngine: the one object hosts hold for a session.
//!
//! Owns the Context Store, Behavior Tracker, Ambient Observer and
//! Synthesizer, and routes every inbound event through them in the order
//! store/tracker → synthesizer → ambient observer. Clock, configuration and
//! persistence are injected; nothing here is a global.
//!
//! Subscribers get an `EngineEvent` on every state change. Sends with no
//! subscribers are dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::ambient::AmbientObserver;
use crate::behavior::BehaviorTracker;
use crate::clock::{Clock, LocalMoment, SystemClock};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::navigation;
use crate::persistence::ContextRepository;
use crate::store::{ContextStore, StoreSnapshot};
use crate::synthesis::{SynthesisReport, SynthesisTrigger, Synthesizer};
use crate::types::{
    AmbientState, ContextItem, ContextPatch, ContextType, IntelligenceInsight, NewContext,
    NewInsight, NextAction, PatternType, UserPattern,
};

/// State-changed notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EngineEvent {
    ContextCreated { id: String },
    ContextUpdated { id: String },
    InsightAdded { id: String },
    BehaviorRecorded,
    PatternObserved { id: String },
    SynthesisCompleted { report: SynthesisReport },
    AmbientUpdated { state: AmbientState },
}

pub struct ContextEngineBuilder {
    config: EngineConfig,
    clock: Option<Arc<dyn Clock>>,
    repository: Option<Arc<dyn ContextRepository>>,
}

impl ContextEngineBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Load the initial store from `repository` and save back to it.
    pub fn repository(mut self, repository: Arc<dyn ContextRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn build(self) -> Result<ContextEngine, EngineError> {
        self.config.validate()?;
        let tz = self.config.tz()?;
        let snapshot = match &self.repository {
            Some(repo) => repo.load()?,
            None => StoreSnapshot::default(),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let (events, _) = broadcast::channel(self.config.event_channel_capacity.max(1));

        Ok(ContextEngine {
            store: ContextStore::from_snapshot(snapshot, &self.config)?,
            tracker: BehaviorTracker::new(self.config.max_transition_history),
            observer: AmbientObserver::new(
                self.config.max_ambient_patterns,
                self.config.prediction_confidence_threshold,
                tz,
            ),
            synthesizer: Synthesizer::new(&self.config, tz)?,
            active_view: self.config.default_view.clone(),
            tz,
            clock,
            repository: self.repository,
            events,
            config: self.config,
        })
    }
}

pub struct ContextEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    tz: Option<Tz>,
    store: ContextStore,
    tracker: BehaviorTracker,
    observer: AmbientObserver,
    synthesizer: Synthesizer,
    active_view: String,
    repository: Option<Arc<dyn ContextRepository>>,
    events: broadcast::Sender<EngineEvent>,
}

impl ContextEngine {
    pub fn builder(config: EngineConfig) -> ContextEngineBuilder {
        ContextEngineBuilder {
            config,
            clock: None,
            repository: None,
        }
    }

    /// Empty engine on wall-clock time with no repository.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::builder(config).build()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // =========================================================================
    // Inbound events
    // =========================================================================

    pub fn create_context(&mut self, draft: NewContext) -> Result<String, EngineError> {
        let now = self.now();
        let id = self.store.create_context(draft, now)?;
        self.emit(EngineEvent::ContextCreated { id: id.clone() });

        if self.config.synthesize_on_change {
            self.run_synthesis(SynthesisTrigger::ContextsChanged);
        } else {
            self.refresh_ambient(now);
        }
        Ok(id)
    }

    /// Create from a loosely-typed collaborator payload.
    pub fn create_context_json(&mut self, payload: &Value) -> Result<String, EngineError> {
        let draft = NewContext::from_json(payload)?;
        self.create_context(draft)
    }

    /// Returns false (and changes nothing) when `id` is unknown.
    pub fn update_context(&mut self, id: &str, patch: ContextPatch) -> bool {
        if !self.store.update_context(id, patch) {
            return false;
        }
        self.emit(EngineEvent::ContextUpdated { id: id.to_string() });
        let now = self.now();
        self.refresh_ambient(now);
        true
    }

    /// Malformed patches are errors; unknown ids are `Ok(false)`.
    pub fn update_context_json(&mut self, id: &str, payload: &Value) -> Result<bool, EngineError> {
        let patch = ContextPatch::from_json(payload)?;
        Ok(self.update_context(id, patch))
    }

    /// Insights from collaborators (tone analysis, document processing).
    pub fn add_insight(&mut self, draft: NewInsight) -> Result<String, EngineError> {
        let now = self.now();
        let id = self.store.add_insight(draft, now)?;
        self.emit(EngineEvent::InsightAdded { id: id.clone() });
        self.refresh_ambient(now);
        Ok(id)
    }

    /// Record a navigation and make `to` the active view. Also observes a
    /// timing pattern `{timeOfDay}-{to}`.
    pub fn record_transition(&mut self, from: &str, to: &str) {
        let now = self.now();
        self.tracker.record_transition(from, to, now);
        self.emit(EngineEvent::BehaviorRecorded);

        let tod = LocalMoment::at(now, self.tz).time_of_day();
        self.observe_pattern(PatternType::Timing, &format!("{}-{}", tod.as_str(), to));

        let view_changed = self.active_view != to;
        self.active_view = to.to_string();

        if view_changed && self.config.synthesize_on_change {
            self.run_synthesis(SynthesisTrigger::ViewChanged);
        } else {
            self.refresh_ambient(now);
        }
    }

    /// Record a user action; the action name is observed as a preference.
    pub fn record_action(&mut self, action: &str, context: &str) {
        let now = self.now();
        self.tracker.record_action(action, context, now);
        self.emit(EngineEvent::BehaviorRecorded);
        self.observe_pattern(PatternType::Preference, action);
    }

    /// Ledger changes can flip the predicted next action, so the ambient
    /// state is refreshed before returning.
    pub fn observe_pattern(&mut self, pattern_type: PatternType, key: &str) -> UserPattern {
        let now = self.now();
        let pattern = self.observer.observe_pattern(pattern_type, key, now);
        self.emit(EngineEvent::PatternObserved {
            id: pattern.id.clone(),
        });
        self.refresh_ambient(now);
        pattern
    }

    // =========================================================================
    // Synthesis
    // =========================================================================

    /// Run a periodic pass if the interval has elapsed.
    pub fn tick(&mut self) -> Option<SynthesisReport> {
        if !self.synthesizer.is_due(self.now()) {
            return None;
        }
        Some(self.run_synthesis(SynthesisTrigger::Periodic))
    }

    /// Run a full pass now, then refresh the ambient state from its output.
    pub fn run_synthesis(&mut self, trigger: SynthesisTrigger) -> SynthesisReport {
        let now = self.now();
        let report = self.synthesizer.run(
            trigger,
            &mut self.store,
            &self.tracker,
            &self.active_view,
            now,
        );

        for id in report.insight_id.iter().chain(&report.opportunity_ids) {
            self.emit(EngineEvent::InsightAdded { id: id.clone() });
        }
        self.emit(EngineEvent::SynthesisCompleted {
            report: report.clone(),
        });
        self.refresh_ambient(now);
        report
    }

    fn refresh_ambient(&mut self, now: DateTime<Utc>) {
        let changed = self.observer.refresh(
            &self.active_view,
            self.store.contexts(),
            self.store.insights(),
            now,
        );
        if changed {
            self.emit(EngineEvent::AmbientUpdated {
                state: self.observer.state().clone(),
            });
        }
    }

    // =========================================================================
    // Session + persistence
    // =========================================================================

    /// Write contexts and insights through the configured repository.
    pub fn save(&self) -> Result<(), EngineError> {
        let repo = self
            .repository
            .as_ref()
            .ok_or_else(|| EngineError::Persistence("No repository configured".to_string()))?;
        repo.save(self.store.contexts(), self.store.insights())
            .inspect_err(|e| log::warn!("Failed to save store: {}", e))
    }

    /// End of session: behavior log, ambient ledger and ephemeral output are
    /// cleared. Contexts and insights stay.
    pub fn reset_session(&mut self) {
        self.tracker.reset();
        self.observer.reset();
        self.synthesizer.reset();
        self.active_view = self.config.default_view.clone();
        log::info!("Session reset");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn contexts(&self) -> &[ContextItem] {
        self.store.contexts()
    }

    pub fn insights(&self) -> &[IntelligenceInsight] {
        self.store.insights()
    }

    pub fn get_context(&self, id: &str) -> Option<&ContextItem> {
        self.store.get(id)
    }

    pub fn priority_contexts(&self) -> Vec<&ContextItem> {
        self.store.priority_contexts()
    }

    pub fn related(&self, id: &str) -> Vec<&ContextItem> {
        self.store.related(id)
    }

    pub fn by_type(&self, context_type: ContextType) -> Vec<&ContextItem> {
        self.store.by_type(context_type)
    }

    pub fn suggested_views(&self, view: &str) -> Vec<String> {
        navigation::suggested_views(&self.tracker, view)
    }

    pub fn view_description(&self, view: &str) -> &'static str {
        navigation::view_description(view)
    }

    pub fn ambient_state(&self) -> &AmbientState {
        self.observer.state()
    }

    pub fn next_best_actions(&self) -> &[NextAction] {
        self.synthesizer.next_actions()
    }

    /// Ephemeral suggestions from the latest synthesis pass.
    pub fn suggestions(&self) -> &[String] {
        self.synthesizer.suggestions()
    }

    pub fn patterns(&self) -> Vec<&UserPattern> {
        self.observer.ledger().all()
    }

    pub fn behavior(&self) -> &BehaviorTracker {
        &self.tracker
    }

    pub fn active_view(&self) -> &str {
        &self.active_view
    }

    pub fn last_synthesis(&self) -> Option<&SynthesisReport> {
        self.synthesizer.last_report()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
