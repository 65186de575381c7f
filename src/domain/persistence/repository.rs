//! Snapshot store trait definition

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::CacheSnapshot;
use crate::domain::DomainError;

/// Durable home of the cache snapshot
///
/// Implementations rewrite the whole record on every save; callers are
/// responsible for serializing concurrent saves.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnapshotStore: Send + Sync + std::fmt::Debug {
    /// Reads the stored snapshot, `None` if nothing has been stored yet
    ///
    /// A record that exists but cannot be parsed is an error.
    async fn load(&self) -> Result<Option<CacheSnapshot>, DomainError>;

    /// Replaces the stored snapshot
    async fn save(&self, snapshot: &CacheSnapshot) -> Result<(), DomainError>;

    /// Human-readable location, for logs
    fn location(&self) -> String;
}
