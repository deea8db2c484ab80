//! Population snapshots
//!
//! The whole population (plus the consensus history) is written as one JSON
//! record. Saves go through a temporary file and a rename so a crash never
//! leaves a half-written snapshot behind.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tradehive_common::{Agent, ConsensusSignal, Result};

/// Serialized population state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub generation: u64,
    /// Unix millis
    pub saved_at: i64,
    pub agents: Vec<Agent>,
    /// Consensus history, oldest first
    #[serde(default)]
    pub signals: Vec<ConsensusSignal>,
}

/// Snapshot storage backend
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, record: &PopulationRecord) -> Result<()>;

    /// None when nothing has been saved yet
    async fn load(&self) -> Result<Option<PopulationRecord>>;
}

/// JSON file on local disk
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn save(&self, record: &PopulationRecord) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(record)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!(
            path = %self.path.display(),
            agents = record.agents.len(),
            generation = record.generation,
            bytes = bytes.len(),
            "Population snapshot saved"
        );
        Ok(())
    }

    async fn load(&self) -> Result<Option<PopulationRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No population snapshot found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let record: PopulationRecord = serde_json::from_slice(&bytes)?;
        info!(
            path = %self.path.display(),
            agents = record.agents.len(),
            generation = record.generation,
            "Population snapshot loaded"
        );
        Ok(Some(record))
    }
}

/// In-process store for tests and ephemeral runs
#[derive(Default)]
pub struct InMemorySnapshotStore {
    record: RwLock<Option<PopulationRecord>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(&self, record: &PopulationRecord) -> Result<()> {
        *self.record.write() = Some(record.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<PopulationRecord>> {
        Ok(self.record.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradehive_common::HiveError;
    use tradehive_darwinian::Breeder;

    fn record(n: usize) -> PopulationRecord {
        let mut breeder = Breeder::seeded(3);
        PopulationRecord {
            generation: 7,
            saved_at: 1_700_000_000_000,
            agents: (0..n).map(|_| breeder.random_agent(7)).collect(),
            signals: Vec::new(),
        }
    }

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("tradehive-{}", uuid::Uuid::now_v7()))
            .join("population.json")
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let path = scratch_path();
        let store = JsonFileStore::new(&path);
        let saved = record(25);

        store.save(&saved).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert!(!store.tmp_path().exists());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let store = JsonFileStore::new(scratch_path());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let path = scratch_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{ not json").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, HiveError::Serialization(_)));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = InMemorySnapshotStore::new();
        assert!(store.load().await.unwrap().is_none());
        store.save(&record(3)).await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap().agents.len(), 3);
    }
}
