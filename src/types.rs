//! Core data model shared by the store, tracker, observer and synthesizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EngineError;
use crate::metadata::{metadata_from_json, Metadata};

// ---------------------------------------------------------------------------
// Context items
// ---------------------------------------------------------------------------

/// Which collaborator module produced a context item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    Meeting,
    Social,
    Email,
    Document,
    Memory,
    Idea,
}

impl ContextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextType::Meeting => "meeting",
            ContextType::Social => "social",
            ContextType::Email => "email",
            ContextType::Document => "document",
            ContextType::Memory => "memory",
            ContextType::Idea => "idea",
        }
    }

    /// Strict parse. Unknown strings are a caller bug, not a fallback.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "meeting" => Some(ContextType::Meeting),
            "social" => Some(ContextType::Social),
            "email" => Some(ContextType::Email),
            "document" => Some(ContextType::Document),
            "memory" => Some(ContextType::Memory),
            "idea" => Some(ContextType::Idea),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Sort rank: urgent 4, high 3, medium 2, low 1.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Urgent => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContextStatus {
    #[default]
    Active,
    Pending,
    Completed,
    Archived,
}

impl ContextStatus {
    /// Active and pending items are the ones still asking for attention.
    pub fn is_open(&self) -> bool {
        matches!(self, ContextStatus::Active | ContextStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextStatus::Active => "active",
            ContextStatus::Pending => "pending",
            ContextStatus::Completed => "completed",
            ContextStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ContextStatus::Active),
            "pending" => Some(ContextStatus::Pending),
            "completed" => Some(ContextStatus::Completed),
            "archived" => Some(ContextStatus::Archived),
            _ => None,
        }
    }
}

/// A discrete unit of captured activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextItem {
    pub id: String,
    #[serde(rename = "type")]
    pub context_type: ContextType,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub priority: Priority,
    pub status: ContextStatus,
    /// Outgoing edges only. Relatedness queries resolve both directions.
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Fields a producer supplies when creating a context item. The store
/// assigns id, timestamp and connections.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContext {
    pub context_type: ContextType,
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub status: ContextStatus,
    pub metadata: Metadata,
}

impl NewContext {
    pub fn new(context_type: ContextType, title: impl Into<String>) -> Self {
        Self {
            context_type,
            title: title.into(),
            content: String::new(),
            priority: Priority::default(),
            status: ContextStatus::default(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: ContextStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<crate::metadata::MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Reject drafts a collaborator should never have sent.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.title.trim().is_empty() {
            return Err(EngineError::MissingField("title"));
        }
        Ok(())
    }

    /// Build a draft from a loosely typed collaborator payload.
    ///
    /// Required: `type`, `title`. Defaults: empty content, medium priority,
    /// active status, empty metadata.
    pub fn from_json(value: &Value) -> Result<Self, EngineError> {
        let obj = as_object(value, "context")?;

        let type_str = str_field(obj, "type")?.ok_or(EngineError::MissingField("type"))?;
        let context_type = ContextType::parse(type_str).ok_or_else(|| invalid("type", type_str))?;
        let title = str_field(obj, "title")?.ok_or(EngineError::MissingField("title"))?;

        let mut draft = NewContext::new(context_type, title);
        if let Some(content) = str_field(obj, "content")? {
            draft.content = content.to_string();
        }
        if let Some(p) = str_field(obj, "priority")? {
            draft.priority = Priority::parse(p).ok_or_else(|| invalid("priority", p))?;
        }
        if let Some(s) = str_field(obj, "status")? {
            draft.status = ContextStatus::parse(s).ok_or_else(|| invalid("status", s))?;
        }
        if let Some(meta) = obj.get("metadata") {
            draft.metadata = metadata_from_json(meta.clone());
        }

        draft.validate()?;
        Ok(draft)
    }
}

/// Partial update merged into an existing item. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextPatch {
    pub context_type: Option<ContextType>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<ContextStatus>,
    pub connections: Option<Vec<String>>,
    /// Keys are merged into the existing metadata, not replaced wholesale.
    pub metadata: Option<Metadata>,
}

impl ContextPatch {
    pub fn status(status: ContextStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &ContextPatch::default()
    }

    pub fn apply(self, item: &mut ContextItem) {
        if let Some(t) = self.context_type {
            item.context_type = t;
        }
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(content) = self.content {
            item.content = content;
        }
        if let Some(p) = self.priority {
            item.priority = p;
        }
        if let Some(s) = self.status {
            item.status = s;
        }
        if let Some(c) = self.connections {
            item.connections = c;
        }
        if let Some(meta) = self.metadata {
            item.metadata.extend(meta);
        }
    }

    /// Parse a patch payload. Only enum membership is validated.
    pub fn from_json(value: &Value) -> Result<Self, EngineError> {
        let obj = as_object(value, "patch")?;
        let mut patch = ContextPatch::default();

        if let Some(t) = str_field(obj, "type")? {
            patch.context_type = Some(ContextType::parse(t).ok_or_else(|| invalid("type", t))?);
        }
        patch.title = str_field(obj, "title")?.map(str::to_string);
        patch.content = str_field(obj, "content")?.map(str::to_string);
        if let Some(p) = str_field(obj, "priority")? {
            patch.priority = Some(Priority::parse(p).ok_or_else(|| invalid("priority", p))?);
        }
        if let Some(s) = str_field(obj, "status")? {
            patch.status = Some(ContextStatus::parse(s).ok_or_else(|| invalid("status", s))?);
        }
        if let Some(conns) = obj.get("connections") {
            let ids = conns
                .as_array()
                .ok_or_else(|| invalid("connections", &conns.to_string()))?
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            patch.connections = Some(ids);
        }
        if let Some(meta) = obj.get("metadata") {
            patch.metadata = Some(metadata_from_json(meta.clone()));
        }

        Ok(patch)
    }
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Pattern,
    Suggestion,
    Warning,
    Opportunity,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::Pattern => "pattern",
            InsightType::Suggestion => "suggestion",
            InsightType::Warning => "warning",
            InsightType::Opportunity => "opportunity",
        }
    }
}

/// A synthesized observation about contexts or behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelligenceInsight {
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub confidence: f64,
    pub actionable: bool,
    #[serde(default)]
    pub related_items: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInsight {
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub confidence: f64,
    pub actionable: bool,
    pub related_items: Vec<String>,
}

impl NewInsight {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.title.trim().is_empty() {
            return Err(EngineError::MissingField("title"));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(EngineError::InvalidConfidence(self.confidence));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Behavior log entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewTransition {
    pub from: String,
    pub to: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvent {
    pub action: String,
    pub context: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Ambient ledger + state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Workflow,
    Timing,
    Collaboration,
    Preference,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Workflow => "workflow",
            PatternType::Timing => "timing",
            PatternType::Collaboration => "collaboration",
            PatternType::Preference => "preference",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "workflow" => Some(PatternType::Workflow),
            "timing" => Some(PatternType::Timing),
            "collaboration" => Some(PatternType::Collaboration),
            "preference" => Some(PatternType::Preference),
            _ => None,
        }
    }
}

/// A confidence-weighted observation about recurring behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPattern {
    /// `{type}-{pattern}`, stable across observations.
    pub id: String,
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub pattern: String,
    pub confidence: f64,
    pub last_observed: DateTime<Utc>,
    pub frequency: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceMode {
    #[default]
    Focused,
    Collaborative,
    Creative,
    Analytical,
    Social,
}

impl WorkspaceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceMode::Focused => "focused",
            WorkspaceMode::Collaborative => "collaborative",
            WorkspaceMode::Creative => "creative",
            WorkspaceMode::Analytical => "analytical",
            WorkspaceMode::Social => "social",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CognitiveLoad {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    #[default]
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Before noon is morning, before 17:00 afternoon, the rest evening.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentFactors {
    pub time_of_day: TimeOfDay,
    pub day_of_week: String,
    pub meeting_proximity_minutes: Option<i64>,
}

/// Single mutable snapshot of the user's ambient working state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AmbientState {
    pub workspace_mode: WorkspaceMode,
    pub cognitive_load: CognitiveLoad,
    pub next_suggested_action: Option<String>,
    pub environment_factors: EnvironmentFactors,
}

/// A ranked next-best action offered to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextAction {
    pub id: String,
    pub label: String,
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn as_object<'a>(value: &'a Value, what: &'static str) -> Result<&'a Map<String, Value>, EngineError> {
    value.as_object().ok_or_else(|| EngineError::InvalidValue {
        field: what,
        value: "expected a JSON object".to_string(),
    })
}

/// Read an optional string field; present-but-not-a-string is invalid.
fn str_field<'a>(obj: &'a Map<String, Value>, key: &'static str) -> Result<Option<&'a str>, EngineError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(invalid(key, &other.to_string())),
    }
}

fn invalid(field: &'static str, value: &str) -> EngineError {
    EngineError::InvalidValue {
        field,
        value: value.to_string(),
    }
}
