use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between tokens of an intent label
pub const LABEL_SEPARATOR: &str = ".";

/// Canonical bag of significant words describing what a query is about
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentLabel(String);

impl IntentLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Joins tokens with the label separator
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parts: Vec<String> = tokens.into_iter().map(|t| t.as_ref().to_string()).collect();
        Self(parts.join(LABEL_SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split(LABEL_SEPARATOR).filter(|t| !t.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Substring test against the whole label, used by keyword rules
    pub fn mentions(&self, keyword: &str) -> bool {
        self.0.contains(keyword)
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IntentLabel {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
