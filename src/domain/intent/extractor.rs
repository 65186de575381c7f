//! Intent label extraction

use std::collections::HashSet;
use std::sync::Arc;

use super::label::IntentLabel;
use super::stemmer::{SnowballStemmer, Stemmer};
use super::stop_words::{DEFAULT_FILLER_WORDS, ENGLISH_STOP_WORDS};

/// Derives intent labels from raw query text
///
/// Extraction is pure: the same query always yields the same label.
#[derive(Debug, Clone)]
pub struct IntentExtractor {
    stop_words: HashSet<String>,
    filler_words: HashSet<String>,
    stemmer: Arc<dyn Stemmer>,
}

impl Default for IntentExtractor {
    fn default() -> Self {
        Self::new(
            ENGLISH_STOP_WORDS.iter().copied(),
            DEFAULT_FILLER_WORDS.iter().copied(),
            Arc::new(SnowballStemmer::english()),
        )
    }
}

impl IntentExtractor {
    pub fn new<S, F, W, X>(stop_words: S, filler_words: F, stemmer: Arc<dyn Stemmer>) -> Self
    where
        S: IntoIterator<Item = W>,
        W: AsRef<str>,
        F: IntoIterator<Item = X>,
        X: AsRef<str>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
            filler_words: filler_words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
            stemmer,
        }
    }

    /// Extracts the intent label of a query
    pub fn extract(&self, query: &str) -> IntentLabel {
        let cleaned: String = query
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
            .collect();

        let mut seen = HashSet::new();
        let mut tokens: Vec<String> = cleaned
            .split_whitespace()
            .filter(|word| !self.stop_words.contains(*word))
            .map(|word| self.stemmer.stem(word))
            .filter(|stem| seen.insert(stem.clone()))
            .collect();

        if tokens.is_empty() {
            return IntentLabel::from_tokens(query.split_whitespace());
        }

        if tokens.len() > 1 && self.filler_words.contains(&tokens[0]) {
            tokens.remove(0);
        }

        IntentLabel::from_tokens(tokens)
    }
}
