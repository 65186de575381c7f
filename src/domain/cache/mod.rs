//! Cache domain - bounded caches and the two memoization tiers

mod bounded;
mod fingerprint_cache;
mod intent_store;
mod policy;

pub use bounded::{BoundedCache, FrequencyCache, RecencyCache};
pub use fingerprint_cache::{FingerprintCache, FingerprintEntry, LAST_USED_RESPONSE_KEY};
pub use intent_store::{IntentBucket, IntentResponseStore};
pub use policy::{EvictionPolicy, FrequencyPolicy, RecencyPolicy};
