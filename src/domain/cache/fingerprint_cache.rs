//! Recency-bounded fingerprint -> intent cache

use serde::{Deserialize, Serialize};

use super::bounded::{BoundedCache, RecencyCache};
use crate::domain::intent::{IntentLabel, QueryFingerprint};
use crate::domain::DomainError;

/// Reserved key holding the most recently served response
pub const LAST_USED_RESPONSE_KEY: &str = "last_used_response";

/// Value stored in the fingerprint cache
///
/// Fingerprint keys map to `{"intent": ...}`; the sentinel key maps to a
/// bare response string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FingerprintEntry {
    Intent { intent: IntentLabel },
    Response(String),
}

/// Remembers which intent answered a given fingerprint
#[derive(Debug)]
pub struct FingerprintCache {
    cache: RecencyCache<String, FingerprintEntry>,
}

impl FingerprintCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: BoundedCache::new(capacity),
        }
    }

    /// Intent previously recorded for a fingerprint, promoting it on hit
    pub fn intent_for(
        &self,
        fingerprint: &QueryFingerprint,
    ) -> Result<Option<IntentLabel>, DomainError> {
        match self.cache.get(&fingerprint.as_str().to_string())? {
            Some(FingerprintEntry::Intent { intent }) => Ok(Some(intent)),
            _ => Ok(None),
        }
    }

    pub fn record(
        &self,
        fingerprint: &QueryFingerprint,
        intent: IntentLabel,
    ) -> Result<(), DomainError> {
        self.cache.put(
            fingerprint.as_str().to_string(),
            FingerprintEntry::Intent { intent },
        )
    }

    /// The response served most recently, if still cached
    pub fn last_served(&self) -> Result<Option<String>, DomainError> {
        match self.cache.get(&LAST_USED_RESPONSE_KEY.to_string())? {
            Some(FingerprintEntry::Response(response)) => Ok(Some(response)),
            _ => Ok(None),
        }
    }

    pub fn set_last_served(&self, response: impl Into<String>) -> Result<(), DomainError> {
        self.cache.put(
            LAST_USED_RESPONSE_KEY.to_string(),
            FingerprintEntry::Response(response.into()),
        )
    }

    pub fn len(&self) -> Result<usize, DomainError> {
        self.cache.len()
    }

    pub fn is_empty(&self) -> Result<bool, DomainError> {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.capacity()
    }

    pub fn export(&self) -> Result<Vec<(String, FingerprintEntry)>, DomainError> {
        self.cache.export()
    }

    pub fn import(&self, entries: Vec<(String, FingerprintEntry)>) -> Result<(), DomainError> {
        self.cache.import(entries)
    }
}
