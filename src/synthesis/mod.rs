//! Pattern/Insight Synthesizer.
//!
//! A batch pass over the Behavior Tracker and Context Store. Each pass:
//! 1. looks at the most recent transitions for a repeated `from->to` pair
//!    and, if one stands out, appends a `pattern` insight to the store;
//! 2. appends an `opportunity` insight for each item connected to items of
//!    another type (a title match across types), once per cluster;
//! 3. regenerates the ephemeral suggestion list (view heuristics followed by
//!    hour-of-day hints);
//! 4. replaces the ranked next-best-action list.
//!
//! Passes recompute in full, so a periodic pass and a change-triggered pass
//! landing in the same tick are safe in either order.

pub mod schedule;
pub mod suggestions;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::behavior::BehaviorTracker;
use crate::clock::LocalMoment;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::store::ContextStore;
use crate::types::{ContextItem, InsightType, NewInsight, NextAction, ViewTransition};
use crate::util::fingerprint;

use self::schedule::SynthesisSchedule;

pub const NAVIGATION_PATTERN_TITLE: &str = "Navigation Pattern Detected";
pub const CONNECTION_OPPORTUNITY_TITLE: &str = "Connection Opportunity";
pub const OPPORTUNITY_CONFIDENCE: f64 = 0.7;

/// What caused a pass to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisTrigger {
    Periodic,
    ViewChanged,
    ContextsChanged,
    Manual,
}

impl SynthesisTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisTrigger::Periodic => "periodic",
            SynthesisTrigger::ViewChanged => "view_changed",
            SynthesisTrigger::ContextsChanged => "contexts_changed",
            SynthesisTrigger::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisReport {
    pub trigger: SynthesisTrigger,
    pub ran_at: DateTime<Utc>,
    pub transitions_considered: usize,
    /// Id of the navigation-pattern insight appended by this pass, if any.
    pub insight_id: Option<String>,
    /// Connection-opportunity insights appended by this pass.
    pub opportunity_ids: Vec<String>,
    pub suggestion_count: usize,
}

/// The dominant transition pair in a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationPattern {
    pub from: String,
    pub to: String,
    pub count: usize,
}

impl NavigationPattern {
    pub fn key(&self) -> String {
        format!("{}->{}", self.from, self.to)
    }
}

/// An item plus the items of other types it was connected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpportunityCluster {
    /// Anchor item first, then its cross-type connections in stored order.
    pub item_ids: Vec<String>,
    pub titles: Vec<String>,
}

impl OpportunityCluster {
    pub fn fingerprint(&self) -> String {
        let parts: Vec<&str> = self.item_ids.iter().map(String::as_str).collect();
        fingerprint(&parts)
    }
}

/// Items whose inferred connections reach a different type. Same-type edges
/// are routine and never form a cluster.
pub fn opportunity_clusters(contexts: &[ContextItem]) -> Vec<OpportunityCluster> {
    contexts
        .iter()
        .filter_map(|item| {
            let cross: Vec<&ContextItem> = item
                .connections
                .iter()
                .filter_map(|id| contexts.iter().find(|c| &c.id == id))
                .filter(|c| c.context_type != item.context_type)
                .collect();
            if cross.is_empty() {
                return None;
            }
            let mut cluster = OpportunityCluster {
                item_ids: vec![item.id.clone()],
                titles: vec![item.title.clone()],
            };
            for c in cross {
                cluster.item_ids.push(c.id.clone());
                cluster.titles.push(c.title.clone());
            }
            Some(cluster)
        })
        .collect()
}

/// Most frequent `from->to` pair in `recent`, provided the window holds at
/// least `min_transitions` entries and the pair repeats `min_repeats` times.
/// Ties go to the pair that appeared first.
pub fn detect_navigation_pattern(
    recent: &[&ViewTransition],
    min_transitions: usize,
    min_repeats: usize,
) -> Option<NavigationPattern> {
    if recent.len() < min_transitions {
        return None;
    }

    let mut counts: Vec<(&str, &str, usize)> = Vec::new();
    for t in recent {
        match counts
            .iter_mut()
            .find(|(from, to, _)| *from == t.from && *to == t.to)
        {
            Some(entry) => entry.2 += 1,
            None => counts.push((t.from.as_str(), t.to.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, &str, usize)> = None;
    for entry in counts {
        if best.map_or(true, |b| entry.2 > b.2) {
            best = Some(entry);
        }
    }

    best.filter(|(_, _, count)| *count >= min_repeats)
        .map(|(from, to, count)| NavigationPattern {
            from: from.to_string(),
            to: to.to_string(),
            count,
        })
}

#[derive(Debug, Clone)]
pub struct Synthesizer {
    recent_window: usize,
    min_transitions: usize,
    min_repeats: usize,
    confidence_divisor: f64,
    confidence_cap: f64,
    suppress_repeats: bool,
    tz: Option<Tz>,
    schedule: SynthesisSchedule,
    last_fingerprint: Option<String>,
    emitted_opportunities: HashSet<String>,
    last_report: Option<SynthesisReport>,
    suggestions: Vec<String>,
    next_actions: Vec<NextAction>,
}

impl Synthesizer {
    /// Fails only when the configured interval is unusable.
    pub fn new(config: &EngineConfig, tz: Option<Tz>) -> Result<Self, EngineError> {
        Ok(Self {
            recent_window: config.recent_transition_window,
            min_transitions: config.min_transitions_for_pattern,
            min_repeats: config.min_pattern_repeats,
            confidence_divisor: config.pattern_confidence_divisor,
            confidence_cap: config.pattern_confidence_cap,
            suppress_repeats: config.suppress_repeat_pattern_insights,
            tz,
            schedule: SynthesisSchedule::new(config.synthesis_interval()?),
            last_fingerprint: None,
            emitted_opportunities: HashSet::new(),
            last_report: None,
            suggestions: Vec::new(),
            next_actions: Vec::new(),
        })
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.schedule.is_due(now)
    }

    /// Confidence for a pair seen `count` times: `min(count / divisor, cap)`.
    pub fn pattern_confidence(&self, count: usize) -> f64 {
        (count as f64 / self.confidence_divisor).min(self.confidence_cap)
    }

    pub fn run(
        &mut self,
        trigger: SynthesisTrigger,
        store: &mut ContextStore,
        tracker: &BehaviorTracker,
        active_view: &str,
        now: DateTime<Utc>,
    ) -> SynthesisReport {
        let recent = tracker.recent_transitions(self.recent_window);
        let insight_id = detect_navigation_pattern(&recent, self.min_transitions, self.min_repeats)
            .and_then(|pattern| self.emit_pattern_insight(store, &pattern, recent.len(), now));
        let opportunity_ids = self.emit_opportunity_insights(store, now);

        let hour = LocalMoment::at(now, self.tz).hour;
        let mut fresh = suggestions::view_suggestions(active_view, tracker, store.contexts());
        fresh.extend(suggestions::time_of_day_suggestions(hour));
        self.suggestions = fresh;
        self.next_actions = suggestions::next_best_actions();

        self.schedule.mark_run(now);

        let report = SynthesisReport {
            trigger,
            ran_at: now,
            transitions_considered: recent.len(),
            insight_id,
            opportunity_ids,
            suggestion_count: self.suggestions.len(),
        };
        log::info!(
            "Synthesis pass ({}): {} transitions, insight emitted: {}, {} opportunities, {} suggestions",
            trigger.as_str(),
            report.transitions_considered,
            report.insight_id.is_some(),
            report.opportunity_ids.len(),
            report.suggestion_count
        );
        self.last_report = Some(report.clone());
        report
    }

    fn emit_pattern_insight(
        &mut self,
        store: &mut ContextStore,
        pattern: &NavigationPattern,
        window_len: usize,
        now: DateTime<Utc>,
    ) -> Option<String> {
        let count = pattern.count.to_string();
        let fp = fingerprint(&[pattern.from.as_str(), pattern.to.as_str(), count.as_str()]);
        if self.suppress_repeats && self.last_fingerprint.as_deref() == Some(fp.as_str()) {
            log::debug!("Skipping repeat navigation insight for {}", pattern.key());
            return None;
        }

        let draft = NewInsight {
            insight_type: InsightType::Pattern,
            title: NAVIGATION_PATTERN_TITLE.to_string(),
            description: format!(
                "You often go from {} to {} ({} of your last {} moves). Consider pinning {} for quicker access.",
                pattern.from, pattern.to, pattern.count, window_len, pattern.to
            ),
            confidence: self.pattern_confidence(pattern.count),
            actionable: true,
            related_items: Vec::new(),
        };

        match store.add_insight(draft, now) {
            Ok(id) => {
                self.last_fingerprint = Some(fp);
                Some(id)
            }
            Err(e) => {
                log::warn!("Navigation insight rejected: {}", e);
                None
            }
        }
    }

    fn emit_opportunity_insights(&mut self, store: &mut ContextStore, now: DateTime<Utc>) -> Vec<String> {
        // Opportunities already in the store (reloaded or from an earlier
        // session) count as emitted.
        for insight in store
            .insights()
            .iter()
            .filter(|i| i.insight_type == InsightType::Opportunity)
        {
            let parts: Vec<&str> = insight.related_items.iter().map(String::as_str).collect();
            self.emitted_opportunities.insert(fingerprint(&parts));
        }

        let mut ids = Vec::new();
        for cluster in opportunity_clusters(store.contexts()) {
            let fp = cluster.fingerprint();
            if self.emitted_opportunities.contains(&fp) {
                continue;
            }

            let draft = NewInsight {
                insight_type: InsightType::Opportunity,
                title: CONNECTION_OPPORTUNITY_TITLE.to_string(),
                description: format!(
                    "\"{}\" shares a topic with {}. Review them together.",
                    cluster.titles[0],
                    cluster.titles[1..]
                        .iter()
                        .map(|t| format!("\"{}\"", t))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
                confidence: OPPORTUNITY_CONFIDENCE,
                actionable: true,
                related_items: cluster.item_ids,
            };

            match store.add_insight(draft, now) {
                Ok(id) => {
                    self.emitted_opportunities.insert(fp);
                    ids.push(id);
                }
                Err(e) => log::warn!("Opportunity insight rejected: {}", e),
            }
        }
        ids
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn next_actions(&self) -> &[NextAction] {
        &self.next_actions
    }

    pub fn last_report(&self) -> Option<&SynthesisReport> {
        self.last_report.as_ref()
    }

    /// Drop ephemeral output and repeat tracking. The schedule keeps its
    /// cadence.
    pub fn reset(&mut self) {
        self.last_fingerprint = None;
        self.emitted_opportunities.clear();
        self.last_report = None;
        self.suggestions.clear();
        self.next_actions.clear();
    }
}
