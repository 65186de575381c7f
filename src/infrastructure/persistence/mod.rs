//! Persistence implementations

mod cache_persistence;
mod in_memory;
mod json_file;

pub use cache_persistence::CachePersistence;
pub use in_memory::InMemorySnapshotStore;
pub use json_file::JsonFileStore;
