//! Persistence collaborator.
//!
//! The engine never writes on its own. Hosts pick a repository and call
//! `ContextEngine::save()` when they want the store on disk.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::EngineError;
use crate::store::StoreSnapshot;
use crate::types::{ContextItem, IntelligenceInsight};
use crate::util::atomic_write_str;

pub trait ContextRepository: Send + Sync {
    fn load(&self) -> Result<StoreSnapshot, EngineError>;
    fn save(&self, contexts: &[ContextItem], insights: &[IntelligenceInsight]) -> Result<(), EngineError>;
}

/// Whole-store JSON file, rewritten atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContextRepository for JsonFileRepository {
    /// A missing file is an empty store, not an error.
    fn load(&self) -> Result<StoreSnapshot, EngineError> {
        if !self.path.exists() {
            log::debug!("No store at {}, starting empty", self.path.display());
            return Ok(StoreSnapshot::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content).map_err(|e| {
            EngineError::Persistence(format!("{}: {}", self.path.display(), e))
        })?;
        log::info!(
            "Loaded {} contexts and {} insights from {}",
            snapshot.contexts.len(),
            snapshot.insights.len(),
            self.path.display()
        );
        Ok(snapshot)
    }

    fn save(&self, contexts: &[ContextItem], insights: &[IntelligenceInsight]) -> Result<(), EngineError> {
        let snapshot = StoreSnapshot {
            contexts: contexts.to_vec(),
            insights: insights.to_vec(),
        };
        let content = serde_json::to_string_pretty(&snapshot)?;
        atomic_write_str(&self.path, &content)
            .map_err(|e| EngineError::Persistence(format!("{}: {}", self.path.display(), e)))
    }
}

/// In-process repository for tests and hosts that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    snapshot: Mutex<StoreSnapshot>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.snapshot.lock().clone()
    }
}

impl ContextRepository for MemoryRepository {
    fn load(&self) -> Result<StoreSnapshot, EngineError> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, contexts: &[ContextItem], insights: &[IntelligenceInsight]) -> Result<(), EngineError> {
        *self.snapshot.lock() = StoreSnapshot {
            contexts: contexts.to_vec(),
            insights: insights.to_vec(),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::store::ContextStore;
    use crate::types::{ContextType, InsightType, NewContext, NewInsight, Priority};
    use chrono::Utc;

    fn populated_store() -> ContextStore {
        let mut store = ContextStore::new(&EngineConfig::default()).unwrap();
        store
            .create_context(
                NewContext::new(ContextType::Meeting, "Acme QBR")
                    .with_priority(Priority::High)
                    .with_metadata("startTime", "2026-10-16T14:00:00Z"),
                Utc::now(),
            )
            .unwrap();
        store
            .add_insight(
                NewInsight {
                    insight_type: InsightType::Warning,
                    title: "Overbooked".into(),
                    description: "Three meetings overlap this afternoon".into(),
                    confidence: 0.9,
                    actionable: true,
                    related_items: vec![],
                },
                Utc::now(),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("nested").join("store.json"));
        let store = populated_store();

        repo.save(store.contexts(), store.insights()).unwrap();
        let loaded = repo.load().unwrap();

        assert_eq!(loaded, store.snapshot());
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("absent.json"));
        assert_eq!(repo.load().unwrap(), StoreSnapshot::default());
    }

    #[test]
    fn test_corrupt_file_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileRepository::new(&path).load().unwrap_err();
        assert!(matches!(err, EngineError::Persistence(_)));
        assert!(!err.is_caller_bug());
    }

    #[test]
    fn test_saved_file_uses_camel_case_wire_names() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("store.json"));
        let store = populated_store();
        repo.save(store.contexts(), store.insights()).unwrap();

        let raw = fs::read_to_string(repo.path()).unwrap();
        assert!(raw.contains("\"relatedItems\""));
        assert!(raw.contains("\"type\": \"meeting\""));
    }

    #[test]
    fn test_memory_repository_replaces_snapshot() {
        let repo = MemoryRepository::new();
        let store = populated_store();
        repo.save(store.contexts(), store.insights()).unwrap();
        assert_eq!(repo.load().unwrap().contexts.len(), 1);

        repo.save(&[], &[]).unwrap();
        assert_eq!(repo.snapshot(), StoreSnapshot::default());
    }
}
