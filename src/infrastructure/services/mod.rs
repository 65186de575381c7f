//! Infrastructure services

mod background;
mod memoization_service;

pub use background::{BackgroundQueue, Job, DEFAULT_CONCURRENCY, DEFAULT_QUEUE_CAPACITY};
pub use memoization_service::{
    CacheStats, MemoizationOrchestrator, OrchestratorBuilder, OrchestratorSettings, QueryAnalysis,
    DEFAULT_FINGERPRINT_CAPACITY, DEFAULT_INTENT_CAPACITY,
};
