//! Frequency-bounded intent -> response bucket store

use serde::{Deserialize, Serialize};

use super::bounded::{BoundedCache, FrequencyCache};
use crate::domain::intent::IntentLabel;
use crate::domain::DomainError;

/// Distinct responses recorded for one intent, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct IntentBucket {
    responses: Vec<String>,
}

impl IntentBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a response unless an identical one is already present
    pub fn push_unique(&mut self, response: impl Into<String>) -> bool {
        let response = response.into();

        if self.responses.contains(&response) {
            return false;
        }

        self.responses.push(response);
        true
    }

    /// Drops the oldest responses until at most `max` remain (never fewer than one)
    pub fn keep_newest(&mut self, max: usize) -> usize {
        let excess = self.responses.len().saturating_sub(max.max(1));
        self.responses.drain(..excess);
        excess
    }

    pub fn contains(&self, response: &str) -> bool {
        self.responses.iter().any(|r| r == response)
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

impl From<Vec<String>> for IntentBucket {
    fn from(responses: Vec<String>) -> Self {
        let mut bucket = Self::new();

        for response in responses {
            bucket.push_unique(response);
        }

        bucket
    }
}

impl From<IntentBucket> for Vec<String> {
    fn from(bucket: IntentBucket) -> Self {
        bucket.responses
    }
}

/// Groups response variants under their intent label
#[derive(Debug)]
pub struct IntentResponseStore {
    cache: FrequencyCache<IntentLabel, IntentBucket>,
    max_variants: Option<usize>,
}

impl IntentResponseStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: BoundedCache::new(capacity),
            max_variants: None,
        }
    }

    /// Caps every bucket; appending past the cap drops the oldest variant
    pub fn with_max_variants(mut self, max_variants: Option<usize>) -> Self {
        self.max_variants = max_variants;
        self
    }

    /// Bucket for an intent; counts as an access
    pub fn bucket(&self, intent: &IntentLabel) -> Result<Option<IntentBucket>, DomainError> {
        self.cache.get(intent)
    }

    /// Adds a response to an intent's bucket, returning whether it was new
    pub fn append(
        &self,
        intent: IntentLabel,
        response: impl Into<String>,
    ) -> Result<bool, DomainError> {
        let response = response.into();
        let max_variants = self.max_variants;
        let mut added = false;

        self.cache.update(intent, |current| {
            let mut bucket = current.unwrap_or_default();
            added = bucket.push_unique(response);
            if let Some(max) = max_variants {
                bucket.keep_newest(max);
            }
            bucket
        })?;

        Ok(added)
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

    pub fn export(&self) -> Result<Vec<(IntentLabel, IntentBucket)>, DomainError> {
        self.cache.export()
    }

    pub fn import(&self, entries: Vec<(IntentLabel, IntentBucket)>) -> Result<(), DomainError> {
        self.cache.import(entries)
    }
}
