//! Persisted form of both caches

use serde::{Deserialize, Serialize};

use crate::domain::cache::{FingerprintEntry, IntentBucket};
use crate::domain::intent::IntentLabel;

/// Full contents of both caches, each section ordered oldest first
///
/// Both sections serialize as JSON objects whose key order is the export
/// order, so reloading reseeds eviction order from the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    #[serde(default, with = "ordered_map")]
    pub fingerprints: Vec<(String, FingerprintEntry)>,
    #[serde(default, with = "ordered_map")]
    pub intents: Vec<(IntentLabel, IntentBucket)>,
}

impl CacheSnapshot {
    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty() && self.intents.is_empty()
    }
}

/// (De)serializes a `Vec<(K, V)>` as a JSON object, keeping entry order
mod ordered_map {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use serde::ser::{Serialize, SerializeMap, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<K, V, S>(entries: &Vec<(K, V)>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;

        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }

        map.end()
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<Vec<(K, V)>, D::Error>
    where
        K: Deserialize<'de>,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }

    struct OrderedVisitor<K, V>(PhantomData<(K, V)>);

    impl<'de, K, V> Visitor<'de> for OrderedVisitor<K, V>
    where
        K: Deserialize<'de>,
        V: Deserialize<'de>,
    {
        type Value = Vec<(K, V)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));

            while let Some((key, value)) = access.next_entry()? {
                entries.push((key, value));
            }

            Ok(entries)
        }
    }
}
