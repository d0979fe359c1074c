//! Behavior Tracker: session log of view transitions and user actions.
//!
//! Lives for one session. Retained history is capped so a long-running
//! session cannot grow without bound; the oldest entries go first.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::types::{ActionEvent, ViewTransition};

#[derive(Debug, Clone, Default)]
pub struct BehaviorTracker {
    view_transitions: VecDeque<ViewTransition>,
    feature_usage: HashMap<String, u32>,
    action_patterns: VecDeque<ActionEvent>,
    max_history: usize,
}

impl BehaviorTracker {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            ..Default::default()
        }
    }

    pub fn record_transition(&mut self, from: &str, to: &str, now: DateTime<Utc>) {
        self.view_transitions.push_back(ViewTransition {
            from: from.to_string(),
            to: to.to_string(),
            timestamp: now,
        });
        *self.feature_usage.entry(to.to_string()).or_insert(0) += 1;
        trim_front(&mut self.view_transitions, self.max_history);
    }

    pub fn record_action(&mut self, action: &str, context: &str, now: DateTime<Utc>) {
        self.action_patterns.push_back(ActionEvent {
            action: action.to_string(),
            context: context.to_string(),
            timestamp: now,
        });
        trim_front(&mut self.action_patterns, self.max_history);
    }

    /// Destination → count over every retained transition out of `view`.
    pub fn transition_frequency_from(&self, view: &str) -> HashMap<String, u32> {
        let mut freq = HashMap::new();
        for t in self.view_transitions.iter().filter(|t| t.from == view) {
            *freq.entry(t.to.clone()).or_insert(0) += 1;
        }
        freq
    }

    /// Same counts as `transition_frequency_from`, ordered by first
    /// appearance in the log so ties rank deterministically.
    pub fn ordered_frequency_from(&self, view: &str) -> Vec<(String, u32)> {
        let mut ordered: Vec<(String, u32)> = Vec::new();
        for t in self.view_transitions.iter().filter(|t| t.from == view) {
            match ordered.iter_mut().find(|(dest, _)| dest == &t.to) {
                Some((_, count)) => *count += 1,
                None => ordered.push((t.to.clone(), 1)),
            }
        }
        ordered
    }

    /// The last `n` transitions, oldest first.
    pub fn recent_transitions(&self, n: usize) -> Vec<&ViewTransition> {
        let start = self.view_transitions.len().saturating_sub(n);
        self.view_transitions.range(start..).collect()
    }

    pub fn transitions(&self) -> &VecDeque<ViewTransition> {
        &self.view_transitions
    }

    pub fn actions(&self) -> &VecDeque<ActionEvent> {
        &self.action_patterns
    }

    pub fn feature_usage(&self) -> &HashMap<String, u32> {
        &self.feature_usage
    }

    pub fn usage_of(&self, view: &str) -> u32 {
        self.feature_usage.get(view).copied().unwrap_or(0)
    }

    /// End of session: drop everything.
    pub fn reset(&mut self) {
        self.view_transitions.clear();
        self.feature_usage.clear();
        self.action_patterns.clear();
    }
}

/// Drops from the front until `log` fits `max`. Zero means unbounded.
fn trim_front<T>(log: &mut VecDeque<T>, max: usize) {
    while max > 0 && log.len() > max {
        log.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_increments_usage_of_destination() {
        let mut tracker = BehaviorTracker::new(100);
        let now = Utc::now();
        tracker.record_transition("hub", "chat", now);
        tracker.record_transition("chat", "hub", now);
        tracker.record_transition("hub", "chat", now);

        assert_eq!(tracker.usage_of("chat"), 2);
        assert_eq!(tracker.usage_of("hub"), 1);
        assert_eq!(tracker.usage_of("inbox"), 0);
    }

    #[test]
    fn test_frequency_from_filters_by_origin() {
        let mut tracker = BehaviorTracker::new(100);
        let now = Utc::now();
        tracker.record_transition("hub", "chat", now);
        tracker.record_transition("hub", "chat", now);
        tracker.record_transition("hub", "inbox", now);
        tracker.record_transition("inbox", "chat", now);

        let freq = tracker.transition_frequency_from("hub");
        assert_eq!(freq.get("chat"), Some(&2));
        assert_eq!(freq.get("inbox"), Some(&1));
        assert_eq!(freq.len(), 2);
        assert!(tracker.transition_frequency_from("memory").is_empty());
    }

    #[test]
    fn test_recent_transitions_window() {
        let mut tracker = BehaviorTracker::new(100);
        let now = Utc::now();
        for i in 0..12 {
            tracker.record_transition("hub", &format!("v{}", i), now);
        }
        let recent = tracker.recent_transitions(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].to, "v2");
        assert_eq!(recent[9].to, "v11");
        assert_eq!(tracker.recent_transitions(50).len(), 12);
    }

    #[test]
    fn test_history_cap_drops_oldest() {
        let mut tracker = BehaviorTracker::new(3);
        let now = Utc::now();
        for i in 0..5 {
            tracker.record_action(&format!("a{}", i), "chat", now);
        }
        let kept: Vec<&str> = tracker.actions().iter().map(|a| a.action.as_str()).collect();
        assert_eq!(kept, vec!["a2", "a3", "a4"]);
    }

    #[test]
    fn test_capped_log_keeps_window_at_cap() {
        let mut tracker = BehaviorTracker::new(10_000);
        let now = Utc::now();
        for i in 0..10_050 {
            tracker.record_transition("hub", &format!("v{}", i), now);
        }
        assert_eq!(tracker.transitions().len(), 10_000);
        assert_eq!(tracker.transitions().front().unwrap().to, "v50");
        assert_eq!(tracker.transitions().back().unwrap().to, "v10049");

        let recent = tracker.recent_transitions(3);
        let tail: Vec<&str> = recent.iter().map(|t| t.to.as_str()).collect();
        assert_eq!(tail, vec!["v10047", "v10048", "v10049"]);
    }

    #[test]
    fn test_zero_cap_is_unbounded() {
        let mut tracker = BehaviorTracker::new(0);
        let now = Utc::now();
        for i in 0..25 {
            tracker.record_action(&format!("a{}", i), "chat", now);
        }
        assert_eq!(tracker.actions().len(), 25);
    }

    #[test]
    fn test_reset_clears_session() {
        let mut tracker = BehaviorTracker::new(10);
        tracker.record_transition("hub", "chat", Utc::now());
        tracker.record_action("send_message", "chat", Utc::now());
        tracker.reset();
        assert!(tracker.transitions().is_empty());
        assert!(tracker.actions().is_empty());
        assert!(tracker.feature_usage().is_empty());
    }
}
