//! Inbound command envelope and outbound snapshot.
//!
//! Hosts that talk to the engine over a process or IPC boundary send
//! `EngineCommand`s (tagged by `op`) and read back an `EngineSnapshot`.
//! In-process hosts call `ContextEngine` directly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::ContextEngine;
use crate::error::{CommandError, EngineError};
use crate::synthesis::{SynthesisReport, SynthesisTrigger};
use crate::types::{
    AmbientState, ContextItem, InsightType, IntelligenceInsight, NewInsight, NextAction,
    PatternType, UserPattern,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum EngineCommand {
    CreateContext {
        context: Value,
    },
    UpdateContext {
        id: String,
        patch: Value,
    },
    AddInsight {
        #[serde(rename = "type")]
        insight_type: InsightType,
        title: String,
        #[serde(default)]
        description: String,
        confidence: f64,
        #[serde(default)]
        actionable: bool,
        #[serde(default, rename = "relatedItems")]
        related_items: Vec<String>,
    },
    RecordTransition {
        from: String,
        to: String,
    },
    RecordAction {
        action: String,
        #[serde(default)]
        context: String,
    },
    ObservePattern {
        #[serde(rename = "type")]
        pattern_type: PatternType,
        key: String,
    },
    Tick,
    Synthesize,
    ResetSession,
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum CommandOutcome {
    Created { id: String },
    Updated { found: bool },
    Recorded,
    Observed { pattern: UserPattern },
    Synthesized { report: Option<SynthesisReport> },
    Reset,
}

pub fn apply(engine: &mut ContextEngine, command: EngineCommand) -> Result<CommandOutcome, EngineError> {
    let outcome = match command {
        EngineCommand::CreateContext { context } => CommandOutcome::Created {
            id: engine.create_context_json(&context)?,
        },
        EngineCommand::UpdateContext { id, patch } => CommandOutcome::Updated {
            found: engine.update_context_json(&id, &patch)?,
        },
        EngineCommand::AddInsight {
            insight_type,
            title,
            description,
            confidence,
            actionable,
            related_items,
        } => CommandOutcome::Created {
            id: engine.add_insight(NewInsight {
                insight_type,
                title,
                description,
                confidence,
                actionable,
                related_items,
            })?,
        },
        EngineCommand::RecordTransition { from, to } => {
            engine.record_transition(&from, &to);
            CommandOutcome::Recorded
        }
        EngineCommand::RecordAction { action, context } => {
            engine.record_action(&action, &context);
            CommandOutcome::Recorded
        }
        EngineCommand::ObservePattern { pattern_type, key } => CommandOutcome::Observed {
            pattern: engine.observe_pattern(pattern_type, &key),
        },
        EngineCommand::Tick => CommandOutcome::Synthesized {
            report: engine.tick(),
        },
        EngineCommand::Synthesize => CommandOutcome::Synthesized {
            report: Some(engine.run_synthesis(SynthesisTrigger::Manual)),
        },
        EngineCommand::ResetSession => {
            engine.reset_session();
            CommandOutcome::Reset
        }
    };
    Ok(outcome)
}

/// `apply` with the error flattened into its IPC shape.
pub fn apply_for_ipc(engine: &mut ContextEngine, command: EngineCommand) -> Result<CommandOutcome, CommandError> {
    apply(engine, command).map_err(|e| CommandError::from(&e))
}

/// Every outbound query, captured at one instant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub active_view: String,
    pub contexts: Vec<ContextItem>,
    pub insights: Vec<IntelligenceInsight>,
    /// Ids of open items, highest priority first.
    pub priority_contexts: Vec<String>,
    pub suggested_views: Vec<String>,
    pub view_description: String,
    pub ambient_state: AmbientState,
    pub next_best_actions: Vec<NextAction>,
    pub suggestions: Vec<String>,
    pub patterns: Vec<UserPattern>,
}

impl EngineSnapshot {
    pub fn capture(engine: &ContextEngine) -> Self {
        let view = engine.active_view();
        Self {
            active_view: view.to_string(),
            contexts: engine.contexts().to_vec(),
            insights: engine.insights().to_vec(),
            priority_contexts: engine
                .priority_contexts()
                .into_iter()
                .map(|c| c.id.clone())
                .collect(),
            suggested_views: engine.suggested_views(view),
            view_description: engine.view_description(view).to_string(),
            ambient_state: engine.ambient_state().clone(),
            next_best_actions: engine.next_best_actions().to_vec(),
            suggestions: engine.suggestions().to_vec(),
            patterns: engine.patterns().into_iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::ErrorKind;

    fn parse(line: &str) -> EngineCommand {
        serde_json::from_str(line).unwrap()
    }

    fn engine() -> ContextEngine {
        ContextEngine::new(EngineConfig {
            timezone: Some("UTC".into()),
            ..EngineConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_commands_parse_from_json_lines() {
        assert!(matches!(
            parse(r#"{"op":"recordTransition","from":"hub","to":"chat"}"#),
            EngineCommand::RecordTransition { .. }
        ));
        assert!(matches!(parse(r#"{"op":"tick"}"#), EngineCommand::Tick));
        match parse(r#"{"op":"observePattern","type":"collaboration","key":"sarah"}"#) {
            EngineCommand::ObservePattern { pattern_type, key } => {
                assert_eq!(pattern_type, PatternType::Collaboration);
                assert_eq!(key, "sarah");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(serde_json::from_str::<EngineCommand>(r#"{"op":"teleport"}"#).is_err());
    }

    #[test]
    fn test_replay_builds_snapshot() {
        let mut engine = engine();
        let lines = [
            r#"{"op":"createContext","context":{"type":"document","title":"Budget Report","priority":"high"}}"#,
            r#"{"op":"createContext","context":{"type":"document","title":"Budget Review"}}"#,
            r#"{"op":"recordTransition","from":"hub","to":"documents"}"#,
            r#"{"op":"addInsight","type":"opportunity","title":"Merge budgets","confidence":0.7,"relatedItems":[]}"#,
        ];
        for line in lines {
            apply(&mut engine, parse(line)).unwrap();
        }

        let snapshot = EngineSnapshot::capture(&engine);
        assert_eq!(snapshot.active_view, "documents");
        assert_eq!(snapshot.contexts.len(), 2);
        assert_eq!(snapshot.priority_contexts[0], snapshot.contexts[0].id);
        assert_eq!(snapshot.insights.len(), 1);
        assert_eq!(snapshot.next_best_actions.len(), 3);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("ambientState").is_some());
        assert!(json.get("nextBestActions").is_some());
    }

    #[test]
    fn test_bad_payload_maps_to_caller_bug() {
        let mut engine = engine();
        let err = apply_for_ipc(
            &mut engine,
            parse(r#"{"op":"addInsight","type":"warning","title":"Too sure","confidence":1.5}"#),
        )
        .unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::CallerBug);

        let outcome = apply(
            &mut engine,
            parse(r#"{"op":"updateContext","id":"ctx-nope","patch":{"status":"archived"}}"#),
        )
        .unwrap();
        assert_eq!(outcome, CommandOutcome::Updated { found: false });
    }
}
