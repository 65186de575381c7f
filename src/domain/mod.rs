//! Domain layer - Core memoization logic and entities

pub mod cache;
pub mod command;
pub mod error;
pub mod intent;
pub mod llm;
pub mod persistence;
pub mod text;

pub use cache::{
    BoundedCache, FingerprintCache, FingerprintEntry, FrequencyCache, IntentBucket,
    IntentResponseStore, RecencyCache, LAST_USED_RESPONSE_KEY,
};
pub use command::{CommandAction, CommandRules};
pub use error::DomainError;
pub use intent::{IntentExtractor, IntentLabel, QueryFingerprint, QueryNormalizer, Stemmer};
pub use llm::{GenerationRequest, GenerativeBackend, TextStream};
pub use persistence::{CacheSnapshot, SnapshotStore};
