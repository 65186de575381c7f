//! In-memory snapshot store

use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::persistence::{CacheSnapshot, SnapshotStore};
use crate::domain::DomainError;

/// Keeps the last saved snapshot in memory; selected by the `:memory:` store path
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshot: RwLock<Option<CacheSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: CacheSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Some(snapshot)),
        }
    }

    /// Last saved snapshot
    pub fn current(&self) -> Result<Option<CacheSnapshot>, DomainError> {
        let snapshot = self
            .snapshot
            .read()
            .map_err(|e| DomainError::internal(format!("Lock error: {}", e)))?;
        Ok(snapshot.clone())
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load(&self) -> Result<Option<CacheSnapshot>, DomainError> {
        self.current()
    }

    async fn save(&self, snapshot: &CacheSnapshot) -> Result<(), DomainError> {
        let mut current = self
            .snapshot
            .write()
            .map_err(|e| DomainError::internal(format!("Lock error: {}", e)))?;
        *current = Some(snapshot.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::IntentBucket;
    use crate::domain::intent::IntentLabel;

    #[tokio::test]
    async fn test_starts_empty() {
        let store = InMemorySnapshotStore::new();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_previous() {
        let store = InMemorySnapshotStore::new();
        store.save(&CacheSnapshot::default()).await.unwrap();

        let snapshot = CacheSnapshot {
            fingerprints: Vec::new(),
            intents: vec![(
                IntentLabel::new("x"),
                IntentBucket::from(vec!["r1".to_string()]),
            )],
        };
        store.save(&snapshot).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(snapshot));
    }
}
