//! Loads and flushes both caches through a snapshot store

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::cache::{FingerprintCache, IntentResponseStore};
use crate::domain::persistence::{CacheSnapshot, SnapshotStore};
use crate::domain::DomainError;

/// Serializes whole-snapshot writes to the underlying store
///
/// The write lock is held across export and save so an older export can
/// never overwrite a newer one.
#[derive(Debug)]
pub struct CachePersistence {
    store: Arc<dyn SnapshotStore>,
    write_lock: Mutex<()>,
}

impl CachePersistence {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn location(&self) -> String {
        self.store.location()
    }

    /// Seeds both caches from the store
    ///
    /// An absent record is created empty. A malformed record is an error
    /// and leaves the caches untouched.
    pub async fn load_into(
        &self,
        fingerprints: &FingerprintCache,
        intents: &IntentResponseStore,
    ) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;

        let Some(snapshot) = self.store.load().await? else {
            info!(location = %self.store.location(), "No cache snapshot found, starting empty");
            return self.store.save(&CacheSnapshot::default()).await;
        };

        let fingerprint_count = snapshot.fingerprints.len();
        let intent_count = snapshot.intents.len();
        fingerprints.import(snapshot.fingerprints)?;
        intents.import(snapshot.intents)?;

        info!(
            location = %self.store.location(),
            fingerprints = fingerprint_count,
            intents = intent_count,
            "Cache snapshot loaded"
        );
        Ok(())
    }

    /// Exports both caches and rewrites the stored record
    pub async fn flush(
        &self,
        fingerprints: &FingerprintCache,
        intents: &IntentResponseStore,
    ) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;

        let snapshot = CacheSnapshot {
            fingerprints: fingerprints.export()?,
            intents: intents.export()?,
        };
        self.store.save(&snapshot).await?;

        debug!(
            fingerprints = snapshot.fingerprints.len(),
            intents = snapshot.intents.len(),
            "Cache snapshot flushed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::FingerprintEntry;
    use crate::domain::intent::{IntentLabel, QueryFingerprint};
    use crate::domain::persistence::MockSnapshotStore;
    use crate::infrastructure::persistence::{InMemorySnapshotStore, JsonFileStore};

    fn caches() -> (FingerprintCache, IntentResponseStore) {
        (FingerprintCache::new(10), IntentResponseStore::new(10))
    }

    #[tokio::test]
    async fn test_reload_preserves_bucket_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, r#"{"fingerprints": {}, "intents": {"x": ["r1", "r2"]}}"#).unwrap();

        let persistence = CachePersistence::new(Arc::new(JsonFileStore::new(&path)));
        let (fingerprints, intents) = caches();
        persistence.load_into(&fingerprints, &intents).await.unwrap();

        let bucket = intents.bucket(&IntentLabel::new("x")).unwrap().unwrap();
        assert_eq!(bucket.responses(), ["r1".to_string(), "r2".to_string()]);
    }

    #[tokio::test]
    async fn test_round_trip_is_idempotent() {
        let store = Arc::new(InMemorySnapshotStore::new());
        let persistence = CachePersistence::new(store.clone());
        let (fingerprints, intents) = caches();

        let fp = QueryFingerprint::of("what is phishing");
        fingerprints.record(&fp, IntentLabel::new("phish")).unwrap();
        fingerprints.set_last_served("Phishing is a scam.").unwrap();
        intents.append(IntentLabel::new("phish"), "Phishing is a scam.").unwrap();
        intents.append(IntentLabel::new("phish"), "It tricks you.").unwrap();

        persistence.flush(&fingerprints, &intents).await.unwrap();
        let first = store.current().unwrap().unwrap();

        let (reloaded_fps, reloaded_intents) = caches();
        persistence
            .load_into(&reloaded_fps, &reloaded_intents)
            .await
            .unwrap();
        persistence
            .flush(&reloaded_fps, &reloaded_intents)
            .await
            .unwrap();
        let second = store.current().unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(
            reloaded_fps.intent_for(&fp).unwrap(),
            Some(IntentLabel::new("phish"))
        );
    }

    #[tokio::test]
    async fn test_absent_record_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let persistence = CachePersistence::new(Arc::new(JsonFileStore::new(&path)));
        let (fingerprints, intents) = caches();
        persistence.load_into(&fingerprints, &intents).await.unwrap();

        assert!(path.exists());
        assert!(fingerprints.is_empty().unwrap());
        assert!(intents.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_malformed_record_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, r#"{"intents": {"x": 42}}"#).unwrap();

        let persistence = CachePersistence::new(Arc::new(JsonFileStore::new(&path)));
        let (fingerprints, intents) = caches();
        let result = persistence.load_into(&fingerprints, &intents).await;

        assert!(matches!(result, Err(DomainError::Persistence { .. })));
        assert!(intents.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_flush_propagates_store_failure() {
        let mut store = MockSnapshotStore::new();
        store
            .expect_save()
            .times(1)
            .returning(|_| Err(DomainError::persistence("disk full")));

        let persistence = CachePersistence::new(Arc::new(store));
        let (fingerprints, intents) = caches();
        fingerprints
            .record(&QueryFingerprint::of("hi"), IntentLabel::new("hi"))
            .unwrap();

        let result = persistence.flush(&fingerprints, &intents).await;
        assert!(matches!(result, Err(DomainError::Persistence { .. })));
        assert_eq!(
            fingerprints.export().unwrap()[0].1,
            FingerprintEntry::Intent {
                intent: IntentLabel::new("hi")
            }
        );
    }
}
