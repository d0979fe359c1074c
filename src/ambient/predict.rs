//! Next-best-action prediction from the ambient ledger and current state.

use crate::types::{
    ContextItem, ContextStatus, ContextType, InsightType, IntelligenceInsight, TimeOfDay, UserPattern,
};

pub const INBOX_FIRST: &str = "Start with your inbox: email triage is part of your morning routine";
pub const MEETING_PREP_PREFIX: &str = "Prepare for your upcoming meeting";
pub const ADDRESS_INSIGHTS: &str = "Review the high-confidence warnings in your insights";

/// Insight warnings above this confidence ask for attention.
const WARNING_CONFIDENCE: f64 = 0.8;

/// Inputs for one prediction.
pub struct PredictionInput<'a> {
    /// Already filtered to confident entries, most frequent first.
    pub confident_patterns: &'a [&'a UserPattern],
    pub time_of_day: TimeOfDay,
    pub contexts: &'a [ContextItem],
    pub insights: &'a [IntelligenceInsight],
}

fn is_email_related(pattern: &UserPattern) -> bool {
    let key = pattern.pattern.to_lowercase();
    key.contains("email") || key.contains("inbox")
}

/// Rules in order, first match wins:
/// 1. morning and a confident email/inbox pattern → inbox first
/// 2. a pending meeting → meeting prep
/// 3. a warning insight above 0.8 → address insights
pub fn predict_next_action(input: &PredictionInput<'_>) -> Option<String> {
    if input.time_of_day == TimeOfDay::Morning
        && input.confident_patterns.iter().any(|p| is_email_related(p))
    {
        return Some(INBOX_FIRST.to_string());
    }

    if let Some(meeting) = input
        .contexts
        .iter()
        .find(|c| c.context_type == ContextType::Meeting && c.status == ContextStatus::Pending)
    {
        return Some(format!("{}: {}", MEETING_PREP_PREFIX, meeting.title));
    }

    if input
        .insights
        .iter()
        .any(|i| i.insight_type == InsightType::Warning && i.confidence > WARNING_CONFIDENCE)
    {
        return Some(ADDRESS_INSIGHTS.to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;
    use crate::types::{PatternType, Priority};
    use chrono::Utc;

    fn pattern(key: &str) -> UserPattern {
        UserPattern {
            id: format!("timing-{}", key),
            pattern_type: PatternType::Timing,
            pattern: key.into(),
            confidence: 0.8,
            last_observed: Utc::now(),
            frequency: 6,
        }
    }

    fn pending_meeting(title: &str) -> ContextItem {
        ContextItem {
            id: "ctx-m".into(),
            context_type: ContextType::Meeting,
            title: title.into(),
            content: String::new(),
            timestamp: Utc::now(),
            priority: Priority::High,
            status: ContextStatus::Pending,
            connections: vec![],
            metadata: Metadata::new(),
        }
    }

    fn warning(confidence: f64) -> IntelligenceInsight {
        IntelligenceInsight {
            id: "ins-w".into(),
            insight_type: InsightType::Warning,
            title: "Double-booked".into(),
            description: String::new(),
            confidence,
            actionable: true,
            related_items: vec![],
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_morning_inbox_pattern_wins_first() {
        let p = pattern("morning-inbox");
        let patterns = [&p];
        let contexts = [pending_meeting("QBR")];
        let input = PredictionInput {
            confident_patterns: &patterns,
            time_of_day: TimeOfDay::Morning,
            contexts: &contexts,
            insights: &[],
        };
        assert_eq!(predict_next_action(&input).as_deref(), Some(INBOX_FIRST));
    }

    #[test]
    fn test_afternoon_skips_inbox_rule() {
        let p = pattern("morning-inbox");
        let patterns = [&p];
        let contexts = [pending_meeting("QBR")];
        let input = PredictionInput {
            confident_patterns: &patterns,
            time_of_day: TimeOfDay::Afternoon,
            contexts: &contexts,
            insights: &[],
        };
        assert_eq!(
            predict_next_action(&input).as_deref(),
            Some("Prepare for your upcoming meeting: QBR")
        );
    }

    #[test]
    fn test_strong_warning_insight() {
        let insights = [warning(0.85)];
        let input = PredictionInput {
            confident_patterns: &[],
            time_of_day: TimeOfDay::Evening,
            contexts: &[],
            insights: &insights,
        };
        assert_eq!(predict_next_action(&input).as_deref(), Some(ADDRESS_INSIGHTS));
    }

    #[test]
    fn test_no_rule_matches() {
        let insights = [warning(0.8)];
        let input = PredictionInput {
            confident_patterns: &[],
            time_of_day: TimeOfDay::Morning,
            contexts: &[],
            insights: &insights,
        };
        assert_eq!(predict_next_action(&input), None);
    }
}
