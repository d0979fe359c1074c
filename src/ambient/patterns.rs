//! Ambient pattern ledger.
//!
//! Upserts by `{type}-{pattern}`. A new entry starts at 0.3 confidence and
//! each repeat adds 0.1 up to 1.0. When the ledger is full the weakest,
//! stalest entry is evicted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::types::{PatternType, UserPattern};

pub const INITIAL_CONFIDENCE: f64 = 0.3;
pub const CONFIDENCE_STEP: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;

#[derive(Debug, Clone, Default)]
pub struct PatternLedger {
    patterns: HashMap<String, UserPattern>,
    max_entries: usize,
}

pub fn pattern_id(pattern_type: PatternType, key: &str) -> String {
    format!("{}-{}", pattern_type.as_str(), key)
}

/// Step confidence, rounded to hundredths so repeated adds don't drift
/// across the prediction threshold.
fn step_confidence(current: f64) -> f64 {
    (((current + CONFIDENCE_STEP) * 100.0).round() / 100.0).min(MAX_CONFIDENCE)
}

impl PatternLedger {
    pub fn new(max_entries: usize) -> Self {
        Self {
            patterns: HashMap::new(),
            max_entries,
        }
    }

    /// Record one observation and return the updated entry.
    pub fn observe(&mut self, pattern_type: PatternType, key: &str, now: DateTime<Utc>) -> UserPattern {
        let id = pattern_id(pattern_type, key);

        let entry = self
            .patterns
            .entry(id.clone())
            .and_modify(|p| {
                p.frequency += 1;
                p.confidence = step_confidence(p.confidence);
                p.last_observed = now;
            })
            .or_insert_with(|| UserPattern {
                id: id.clone(),
                pattern_type,
                pattern: key.to_string(),
                confidence: INITIAL_CONFIDENCE,
                last_observed: now,
                frequency: 1,
            })
            .clone();

        self.evict_over_capacity(&id);
        entry
    }

    fn evict_over_capacity(&mut self, keep: &str) {
        if self.max_entries == 0 {
            return;
        }
        while self.patterns.len() > self.max_entries {
            let victim = self
                .patterns
                .values()
                .filter(|p| p.id != keep)
                .min_by(|a, b| {
                    a.confidence
                        .total_cmp(&b.confidence)
                        .then(a.last_observed.cmp(&b.last_observed))
                        .then(a.id.cmp(&b.id))
                })
                .map(|p| p.id.clone());

            match victim {
                Some(id) => {
                    log::debug!("Pattern ledger full, evicting {}", id);
                    self.patterns.remove(&id);
                }
                None => break,
            }
        }
    }

    pub fn get(&self, pattern_type: PatternType, key: &str) -> Option<&UserPattern> {
        self.patterns.get(&pattern_id(pattern_type, key))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// All entries, most frequent first.
    pub fn all(&self) -> Vec<&UserPattern> {
        let mut all: Vec<&UserPattern> = self.patterns.values().collect();
        sort_by_frequency(&mut all);
        all
    }

    /// Entries strictly above `threshold`, most frequent first.
    pub fn confident(&self, threshold: f64) -> Vec<&UserPattern> {
        let mut confident: Vec<&UserPattern> = self
            .patterns
            .values()
            .filter(|p| p.confidence > threshold)
            .collect();
        sort_by_frequency(&mut confident);
        confident
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
    }
}

fn sort_by_frequency(patterns: &mut [&UserPattern]) {
    patterns.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then(b.confidence.total_cmp(&a.confidence))
            .then(a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_first_observation_starts_at_point_three() {
        let mut ledger = PatternLedger::new(10);
        let p = ledger.observe(PatternType::Workflow, "focused-mode-hub", Utc::now());
        assert_eq!(p.id, "workflow-focused-mode-hub");
        assert_eq!(p.frequency, 1);
        assert!((p.confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_observations_follow_formula() {
        for n in 1..=12u32 {
            let mut ledger = PatternLedger::new(10);
            let mut last = None;
            for _ in 0..n {
                last = Some(ledger.observe(PatternType::Timing, "morning-inbox", Utc::now()));
            }
            let p = last.unwrap();
            let expected = (0.3 + 0.1 * (n as f64 - 1.0)).min(1.0);
            assert_eq!(p.frequency, n);
            assert!(
                (p.confidence - expected).abs() < 1e-9,
                "n={} expected {}, got {}",
                n,
                expected,
                p.confidence
            );
        }
    }

    #[test]
    fn test_repeat_updates_last_observed() {
        let mut ledger = PatternLedger::new(10);
        let t0 = Utc::now();
        ledger.observe(PatternType::Preference, "dark-mode", t0);
        let later = t0 + Duration::minutes(10);
        let p = ledger.observe(PatternType::Preference, "dark-mode", later);
        assert_eq!(p.last_observed, later);
    }

    #[test]
    fn test_confident_is_strictly_above_threshold() {
        let mut ledger = PatternLedger::new(10);
        let now = Utc::now();
        for _ in 0..4 {
            ledger.observe(PatternType::Workflow, "four", now); // 0.6
        }
        for _ in 0..6 {
            ledger.observe(PatternType::Workflow, "six", now); // 0.8
        }
        for _ in 0..5 {
            ledger.observe(PatternType::Workflow, "five", now); // 0.7
        }

        let ids: Vec<&str> = ledger.confident(0.6).iter().map(|p| p.pattern.as_str()).collect();
        assert_eq!(ids, vec!["six", "five"]);
    }

    #[test]
    fn test_capacity_evicts_weakest_stalest() {
        let mut ledger = PatternLedger::new(2);
        let t0 = Utc::now();
        ledger.observe(PatternType::Workflow, "strong", t0);
        ledger.observe(PatternType::Workflow, "strong", t0);
        ledger.observe(PatternType::Workflow, "weak-old", t0);
        ledger.observe(PatternType::Workflow, "weak-new", t0 + Duration::seconds(1));

        assert_eq!(ledger.len(), 2);
        assert!(ledger.get(PatternType::Workflow, "strong").is_some());
        assert!(ledger.get(PatternType::Workflow, "weak-old").is_none());
        assert!(ledger.get(PatternType::Workflow, "weak-new").is_some());
    }
}
