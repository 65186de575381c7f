//! JSON file snapshot store

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::persistence::{CacheSnapshot, SnapshotStore};
use crate::domain::DomainError;

/// Stores the snapshot as one pretty-printed JSON document
///
/// Saves write a sibling `.tmp` file and rename it over the target, so a
/// crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "cache.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load(&self) -> Result<Option<CacheSnapshot>, DomainError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DomainError::persistence(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let snapshot = serde_json::from_slice(&raw).map_err(|e| {
            DomainError::persistence(format!(
                "Malformed cache snapshot {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &CacheSnapshot) -> Result<(), DomainError> {
        let body = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| DomainError::persistence(format!("Failed to encode snapshot: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::persistence(format!(
                    "Failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &body).await.map_err(|e| {
            DomainError::persistence(format!("Failed to write {}: {}", temp.display(), e))
        })?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            DomainError::persistence(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(path = %self.path.display(), bytes = body.len(), "Snapshot written");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
