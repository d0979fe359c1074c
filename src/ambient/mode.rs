//! Workspace-mode classification and the environment factors around it.

use chrono::{DateTime, Utc};

use crate::clock::LocalMoment;
use crate::metadata::MetadataValue;
use crate::types::{
    CognitiveLoad, ContextItem, ContextStatus, ContextType, EnvironmentFactors, Priority,
    WorkspaceMode,
};

/// Metadata key meeting producers use for the scheduled start.
pub const MEETING_START_KEY: &str = "startTime";

/// A meeting starting within this many minutes raises cognitive load.
const IMMINENT_MEETING_MINUTES: i64 = 15;

/// First matching rule wins:
/// meeting view or an active meeting → collaborative,
/// social view or any social item → social,
/// digest view or any document → analytical,
/// tone view or any idea → creative,
/// otherwise focused.
pub fn classify(active_view: &str, contexts: &[ContextItem]) -> WorkspaceMode {
    let any = |t: ContextType| contexts.iter().any(|c| c.context_type == t);

    let active_meeting = contexts
        .iter()
        .any(|c| c.context_type == ContextType::Meeting && c.status == ContextStatus::Active);

    if active_view == "meeting" || active_meeting {
        WorkspaceMode::Collaborative
    } else if active_view == "social" || any(ContextType::Social) {
        WorkspaceMode::Social
    } else if active_view == "digest" || any(ContextType::Document) {
        WorkspaceMode::Analytical
    } else if active_view == "tone" || any(ContextType::Idea) {
        WorkspaceMode::Creative
    } else {
        WorkspaceMode::Focused
    }
}

/// Minutes until the soonest open meeting that has a future start time.
pub fn meeting_proximity_minutes(contexts: &[ContextItem], now: DateTime<Utc>) -> Option<i64> {
    contexts
        .iter()
        .filter(|c| c.context_type == ContextType::Meeting && c.status.is_open())
        .filter_map(|c| c.metadata.get(MEETING_START_KEY).and_then(parse_start))
        .filter(|start| *start >= now)
        .map(|start| (start - now).num_minutes())
        .min()
}

/// Accepts RFC3339 text or epoch milliseconds.
fn parse_start(value: &MetadataValue) -> Option<DateTime<Utc>> {
    match value {
        MetadataValue::Text(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        MetadataValue::Int(ms) => DateTime::<Utc>::from_timestamp_millis(*ms),
        _ => None,
    }
}

/// Open high/urgent items drive load; an imminent meeting lifts it off low.
pub fn cognitive_load(contexts: &[ContextItem], meeting_proximity: Option<i64>) -> CognitiveLoad {
    let pressing = contexts
        .iter()
        .filter(|c| c.status.is_open() && matches!(c.priority, Priority::High | Priority::Urgent))
        .count();

    let load = match pressing {
        n if n >= 5 => CognitiveLoad::High,
        n if n >= 2 => CognitiveLoad::Medium,
        _ => CognitiveLoad::Low,
    };

    let imminent = meeting_proximity.is_some_and(|m| m <= IMMINENT_MEETING_MINUTES);
    if imminent && load == CognitiveLoad::Low {
        CognitiveLoad::Medium
    } else {
        load
    }
}

pub fn environment_factors(
    moment: LocalMoment,
    contexts: &[ContextItem],
    now: DateTime<Utc>,
) -> EnvironmentFactors {
    EnvironmentFactors {
        time_of_day: moment.time_of_day(),
        day_of_week: moment.day_name().to_string(),
        meeting_proximity_minutes: meeting_proximity_minutes(contexts, now),
    }
}
