//! Navigation ranking: which views to offer next, and what each view is for.
//!
//! Pure functions over the behavior log with static fallback tables for a
//! cold session.

use crate::behavior::BehaviorTracker;

/// How many suggestions to surface.
pub const MAX_SUGGESTED_VIEWS: usize = 3;

/// Offered when the current view has no history and no table entry.
pub const GENERIC_SUGGESTIONS: [&str; 3] = ["hub", "chat", "inbox"];

const DEFAULT_SUGGESTIONS: &[(&str, &[&str])] = &[
    ("hub", &["chat", "inbox", "memory"]),
    ("chat", &["memory", "tone", "hub"]),
    ("inbox", &["digest", "meeting", "chat"]),
    ("memory", &["chat", "documents", "hub"]),
    ("meeting", &["inbox", "memory", "digest"]),
    ("social", &["tone", "chat", "hub"]),
    ("digest", &["inbox", "documents", "memory"]),
    ("tone", &["social", "chat"]),
    ("documents", &["digest", "memory", "chat"]),
    ("settings", &["hub", "chat"]),
];

const VIEW_DESCRIPTIONS: &[(&str, &str)] = &[
    ("hub", "Your overview of today's priorities, insights and open threads."),
    ("chat", "Talk through a problem with the assistant using everything it knows about your day."),
    ("inbox", "Triage incoming email with related meetings and documents alongside."),
    ("memory", "Capture and revisit things worth remembering."),
    ("meeting", "Prepare for upcoming meetings and capture follow-ups afterwards."),
    ("social", "Draft and review posts across your social channels."),
    ("digest", "A condensed summary of what changed across your documents and email."),
    ("tone", "Check how a draft reads before you send it."),
    ("documents", "Upload documents and see what they connect to."),
    ("settings", "Adjust how the workspace behaves."),
];

const GENERIC_DESCRIPTION: &str = "Explore this part of your workspace.";

/// Top destinations out of `current_view` by observed frequency, falling
/// back to the static table (then the generic triple) when there is no
/// history.
pub fn suggested_views(tracker: &BehaviorTracker, current_view: &str) -> Vec<String> {
    let mut ranked = tracker.ordered_frequency_from(current_view);
    if ranked.is_empty() {
        return default_suggestions(current_view);
    }

    // Stable: ties keep first-seen order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(MAX_SUGGESTED_VIEWS)
        .map(|(view, _)| view)
        .collect()
}

/// Static suggestions for a view with no navigation history.
pub fn default_suggestions(current_view: &str) -> Vec<String> {
    let views: &[&str] = DEFAULT_SUGGESTIONS
        .iter()
        .find(|(view, _)| *view == current_view)
        .map(|(_, suggestions)| *suggestions)
        .unwrap_or(&GENERIC_SUGGESTIONS[..]);
    views.iter().map(|v| v.to_string()).collect()
}

pub fn view_description(view: &str) -> &'static str {
    VIEW_DESCRIPTIONS
        .iter()
        .find(|(v, _)| *v == view)
        .map(|(_, desc)| *desc)
        .unwrap_or(GENERIC_DESCRIPTION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_empty_history_uses_table() {
        let tracker = BehaviorTracker::new(100);
        assert_eq!(suggested_views(&tracker, "hub"), vec!["chat", "inbox", "memory"]);
        assert_eq!(suggested_views(&tracker, "tone"), vec!["social", "chat"]);
    }

    #[test]
    fn test_unknown_view_uses_generic_triple() {
        let tracker = BehaviorTracker::new(100);
        assert_eq!(suggested_views(&tracker, "billing"), vec!["hub", "chat", "inbox"]);
    }

    #[test]
    fn test_history_ranks_by_frequency() {
        let mut tracker = BehaviorTracker::new(100);
        let now = Utc::now();
        tracker.record_transition("hub", "chat", now);
        tracker.record_transition("hub", "chat", now);
        tracker.record_transition("hub", "inbox", now);

        assert_eq!(suggested_views(&tracker, "hub"), vec!["chat", "inbox"]);
    }

    #[test]
    fn test_history_truncates_to_three() {
        let mut tracker = BehaviorTracker::new(100);
        let now = Utc::now();
        for (dest, times) in [("memory", 1), ("digest", 4), ("chat", 2), ("inbox", 3)] {
            for _ in 0..times {
                tracker.record_transition("hub", dest, now);
            }
        }
        assert_eq!(suggested_views(&tracker, "hub"), vec!["digest", "inbox", "chat"]);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let mut tracker = BehaviorTracker::new(100);
        let now = Utc::now();
        tracker.record_transition("inbox", "meeting", now);
        tracker.record_transition("inbox", "digest", now);
        assert_eq!(suggested_views(&tracker, "inbox"), vec!["meeting", "digest"]);
    }

    #[test]
    fn test_view_description_fallback() {
        assert!(view_description("inbox").contains("email"));
        assert_eq!(view_description("billing"), GENERIC_DESCRIPTION);
    }
}
