//! Query normalization applied before fingerprinting and extraction

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const NUMBER_WORDS: &[(&str, &str)] = &[
    ("zero", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("ten", "10"),
    ("eleven", "11"),
    ("twelve", "12"),
    ("thirteen", "13"),
    ("fourteen", "14"),
    ("fifteen", "15"),
    ("sixteen", "16"),
    ("seventeen", "17"),
    ("eighteen", "18"),
    ("nineteen", "19"),
    ("twenty", "20"),
    ("thirty", "30"),
    ("forty", "40"),
    ("fifty", "50"),
    ("sixty", "60"),
    ("seventy", "70"),
    ("eighty", "80"),
    ("ninety", "90"),
    ("hundred", "100"),
];

static NUMBER_WORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<&str> = NUMBER_WORDS.iter().map(|(word, _)| *word).collect();
    Regex::new(&format!(r"(?i)\b({})\b", alternatives.join("|")))
        .expect("number word pattern is valid")
});

fn digits_for(word: &str) -> Option<&'static str> {
    let lower = word.to_lowercase();
    NUMBER_WORDS
        .iter()
        .find(|(candidate, _)| *candidate == lower)
        .map(|(_, digits)| *digits)
}

/// Rewrites raw queries into the form the caches key on
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    replace_number_words: bool,
}

impl Default for QueryNormalizer {
    fn default() -> Self {
        Self {
            replace_number_words: true,
        }
    }
}

impl QueryNormalizer {
    pub fn new(replace_number_words: bool) -> Self {
        Self {
            replace_number_words,
        }
    }

    /// Rewrites spelled-out numbers to digits ("level five" -> "level 5").
    ///
    /// Case is preserved; this is the text handed to the extractor and the
    /// backend.
    pub fn rewrite(&self, query: &str) -> String {
        if !self.replace_number_words {
            return query.to_string();
        }

        NUMBER_WORD_PATTERN
            .replace_all(query, |caps: &Captures| {
                digits_for(&caps[0]).unwrap_or(&caps[0]).to_string()
            })
            .into_owned()
    }

    /// Case-normalized text used as fingerprint input
    pub fn fingerprint_input(&self, rewritten: &str) -> String {
        rewritten.to_lowercase()
    }
}
