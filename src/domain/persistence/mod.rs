//! Persistence domain - snapshot format and store seam

mod repository;
mod snapshot;

pub use repository::SnapshotStore;
pub use snapshot::CacheSnapshot;

#[cfg(test)]
pub use repository::MockSnapshotStore;
