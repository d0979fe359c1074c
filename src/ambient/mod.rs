//! Ambient Pattern Observer.
//!
//! Keeps a longer-horizon ledger of workflow, timing, collaboration and
//! preference patterns, classifies the current workspace mode, and predicts
//! a next suggested action. Reads the store's contents but never mutates it.

pub mod mode;
pub mod patterns;
pub mod predict;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::clock::LocalMoment;
use crate::types::{
    AmbientState, ContextItem, IntelligenceInsight, PatternType, UserPattern, WorkspaceMode,
};

use self::patterns::PatternLedger;
use self::predict::PredictionInput;

#[derive(Debug, Clone)]
pub struct AmbientObserver {
    ledger: PatternLedger,
    state: AmbientState,
    prediction_threshold: f64,
    tz: Option<Tz>,
}

impl AmbientObserver {
    pub fn new(max_patterns: usize, prediction_threshold: f64, tz: Option<Tz>) -> Self {
        Self {
            ledger: PatternLedger::new(max_patterns),
            state: AmbientState::default(),
            prediction_threshold,
            tz,
        }
    }

    pub fn observe_pattern(&mut self, pattern_type: PatternType, key: &str, now: DateTime<Utc>) -> UserPattern {
        self.ledger.observe(pattern_type, key, now)
    }

    /// Classify the mode and record it as a workflow pattern
    /// `{mode}-mode-{view}`.
    pub fn detect_workspace_mode(
        &mut self,
        active_view: &str,
        contexts: &[ContextItem],
        now: DateTime<Utc>,
    ) -> WorkspaceMode {
        let detected = mode::classify(active_view, contexts);
        let key = format!("{}-mode-{}", detected.as_str(), active_view);
        self.ledger.observe(PatternType::Workflow, &key, now);
        detected
    }

    pub fn predict_next_action(
        &self,
        contexts: &[ContextItem],
        insights: &[IntelligenceInsight],
        now: DateTime<Utc>,
    ) -> Option<String> {
        let confident = self.ledger.confident(self.prediction_threshold);
        predict::predict_next_action(&PredictionInput {
            confident_patterns: &confident,
            time_of_day: LocalMoment::at(now, self.tz).time_of_day(),
            contexts,
            insights,
        })
    }

    /// Recompute the whole ambient snapshot. Returns true when it changed.
    pub fn refresh(
        &mut self,
        active_view: &str,
        contexts: &[ContextItem],
        insights: &[IntelligenceInsight],
        now: DateTime<Utc>,
    ) -> bool {
        let workspace_mode = self.detect_workspace_mode(active_view, contexts, now);
        let environment_factors = mode::environment_factors(LocalMoment::at(now, self.tz), contexts, now);
        let cognitive_load = mode::cognitive_load(contexts, environment_factors.meeting_proximity_minutes);
        let next_suggested_action = self.predict_next_action(contexts, insights, now);

        let next = AmbientState {
            workspace_mode,
            cognitive_load,
            next_suggested_action,
            environment_factors,
        };

        if next == self.state {
            return false;
        }
        log::debug!(
            "Ambient state: mode={} next={:?}",
            next.workspace_mode.as_str(),
            next.next_suggested_action
        );
        self.state = next;
        true
    }

    pub fn state(&self) -> &AmbientState {
        &self.state
    }

    pub fn ledger(&self) -> &PatternLedger {
        &self.ledger
    }

    /// End of session.
    pub fn reset(&mut self) {
        self.ledger.clear();
        self.state = AmbientState::default();
    }
}
