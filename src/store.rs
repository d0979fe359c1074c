//! Context Store: canonical collection of context items and insights.
//!
//! Owns both lifecycles. Items are never removed, only archived. Connections
//! are inferred once at insertion and stored one-directionally on the new
//! item; `related` resolves them in both directions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::types::{
    ContextItem, ContextPatch, ContextType, IntelligenceInsight, NewContext, NewInsight,
};
use crate::util::titles_overlap;

/// Everything the store owns, in the shape the persistence collaborator
/// loads and saves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default)]
    pub contexts: Vec<ContextItem>,
    #[serde(default)]
    pub insights: Vec<IntelligenceInsight>,
}

#[derive(Debug, Clone)]
pub struct ContextStore {
    /// Insertion order == creation order.
    contexts: Vec<ContextItem>,
    insights: Vec<IntelligenceInsight>,
    connection_window: Duration,
    max_connections: usize,
}

impl ContextStore {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::from_snapshot(StoreSnapshot::default(), config)
    }

    /// Fails only when the configured connection window is unusable.
    pub fn from_snapshot(snapshot: StoreSnapshot, config: &EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            contexts: snapshot.contexts,
            insights: snapshot.insights,
            connection_window: config.connection_window()?,
            max_connections: config.max_connections,
        })
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            contexts: self.contexts.clone(),
            insights: self.insights.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Insert a new item, inferring its connections. Returns the new id.
    pub fn create_context(&mut self, draft: NewContext, now: DateTime<Utc>) -> Result<String, EngineError> {
        draft.validate()?;

        let connections = self.infer_connections(draft.context_type, &draft.title, now);
        let id = format!("ctx-{}", Uuid::new_v4());

        log::info!(
            "Created {} context {} with {} connection(s)",
            draft.context_type.as_str(),
            id,
            connections.len()
        );

        self.contexts.push(ContextItem {
            id: id.clone(),
            context_type: draft.context_type,
            title: draft.title,
            content: draft.content,
            timestamp: now,
            priority: draft.priority,
            status: draft.status,
            connections,
            metadata: draft.metadata,
        });

        Ok(id)
    }

    /// Merge a patch into an existing item. Unknown ids are a no-op and
    /// return false.
    pub fn update_context(&mut self, id: &str, patch: ContextPatch) -> bool {
        match self.contexts.iter_mut().find(|c| c.id == id) {
            Some(item) => {
                patch.apply(item);
                true
            }
            None => {
                log::debug!("update_context: unknown id {}, ignoring", id);
                false
            }
        }
    }

    /// Append an insight. No deduplication happens here.
    pub fn add_insight(&mut self, draft: NewInsight, now: DateTime<Utc>) -> Result<String, EngineError> {
        draft.validate()?;

        let id = format!("ins-{}", Uuid::new_v4());
        self.insights.push(IntelligenceInsight {
            id: id.clone(),
            insight_type: draft.insight_type,
            title: draft.title,
            description: draft.description,
            confidence: draft.confidence,
            actionable: draft.actionable,
            related_items: draft.related_items,
            timestamp: now,
        });
        Ok(id)
    }

    /// Scan existing items newest-first for same-type matches, or recent
    /// items whose titles overlap. Keep the most recent few.
    fn infer_connections(&self, context_type: ContextType, title: &str, now: DateTime<Utc>) -> Vec<String> {
        let window_start = now
            .checked_sub_signed(self.connection_window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        self.contexts
            .iter()
            .rev()
            .filter(|existing| {
                existing.context_type == context_type
                    || (existing.timestamp >= window_start && titles_overlap(&existing.title, title))
            })
            .take(self.max_connections)
            .map(|existing| existing.id.clone())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn contexts(&self) -> &[ContextItem] {
        &self.contexts
    }

    pub fn insights(&self) -> &[IntelligenceInsight] {
        &self.insights
    }

    pub fn get(&self, id: &str) -> Option<&ContextItem> {
        self.contexts.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Items connected to `id` in either direction, in creation order.
    pub fn related(&self, id: &str) -> Vec<&ContextItem> {
        let outgoing: &[String] = self.get(id).map(|c| c.connections.as_slice()).unwrap_or(&[]);

        self.contexts
            .iter()
            .filter(|c| c.id != id)
            .filter(|c| c.connections.iter().any(|conn| conn == id) || outgoing.contains(&c.id))
            .collect()
    }

    pub fn by_type(&self, context_type: ContextType) -> Vec<&ContextItem> {
        self.contexts
            .iter()
            .filter(|c| c.context_type == context_type)
            .collect()
    }

    /// Open items (active/pending), highest priority first. The sort is
    /// stable so equal priorities keep creation order.
    pub fn priority_contexts(&self) -> Vec<&ContextItem> {
        let mut open: Vec<&ContextItem> = self.contexts.iter().filter(|c| c.status.is_open()).collect();
        open.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));
        open
    }
}
