//! Ephemeral suggestions and the static next-best-action list.
//!
//! Regenerated on every synthesis pass and swapped in whole; never
//! persisted as insights.

use crate::behavior::BehaviorTracker;
use crate::types::{ContextItem, ContextStatus, ContextType, NextAction};

pub const EXPLORE_MEMORY: &str =
    "You chat a lot. Try the memory view to keep what matters from those conversations.";
pub const ANALYZE_DOCUMENTS: &str = "Run a deeper analysis on your documents to surface hidden connections.";
pub const MORNING_FOCUS: &str = "Morning focus: tackle your most demanding work while energy is high.";
pub const AFTERNOON_COLLABORATION: &str = "Afternoon collaboration: a good window for meetings and replies.";

/// Chat visits above this count prompt the memory suggestion on the hub.
const CHAT_USAGE_FOR_MEMORY_HINT: u32 = 2;
/// Open emails above this count prompt batch triage in the inbox.
const EMAIL_BACKLOG_FOR_BATCH_HINT: usize = 3;

/// Suggestions that depend on the current view and what's in the store.
pub fn view_suggestions(active_view: &str, tracker: &BehaviorTracker, contexts: &[ContextItem]) -> Vec<String> {
    let mut suggestions = Vec::new();

    if active_view == "hub" && tracker.usage_of("chat") > CHAT_USAGE_FOR_MEMORY_HINT {
        suggestions.push(EXPLORE_MEMORY.to_string());
    }

    if contexts.iter().any(|c| c.context_type == ContextType::Document) {
        suggestions.push(ANALYZE_DOCUMENTS.to_string());
    }

    if active_view == "inbox" {
        let open_emails = contexts
            .iter()
            .filter(|c| c.context_type == ContextType::Email && c.status.is_open())
            .count();
        if open_emails > EMAIL_BACKLOG_FOR_BATCH_HINT {
            suggestions.push(format!(
                "Batch-process your email: {} messages are waiting.",
                open_emails
            ));
        }
    }

    if active_view == "meeting" {
        if let Some(next) = contexts
            .iter()
            .find(|c| c.context_type == ContextType::Meeting && c.status == ContextStatus::Pending)
        {
            suggestions.push(format!("Draft an agenda for \"{}\".", next.title));
        }
    }

    suggestions
}

/// Hour-bucket suggestions, 9–11 and 14–16 inclusive.
pub fn time_of_day_suggestions(hour: u32) -> Vec<String> {
    match hour {
        9..=11 => vec![MORNING_FOCUS.to_string()],
        14..=16 => vec![AFTERNOON_COLLABORATION.to_string()],
        _ => Vec::new(),
    }
}

/// Static weighted actions, highest confidence first.
pub fn next_best_actions() -> Vec<NextAction> {
    let mut actions = vec![
        NextAction {
            id: "memory".to_string(),
            label: "Capture what you want to remember".to_string(),
            confidence: 0.8,
        },
        NextAction {
            id: "digest".to_string(),
            label: "Review today's digest".to_string(),
            confidence: 0.9,
        },
        NextAction {
            id: "meeting".to_string(),
            label: "Prepare for your next meeting".to_string(),
            confidence: 0.85,
        },
    ];
    actions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    actions
}
