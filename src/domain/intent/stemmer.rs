//! Token stemming seam

use std::fmt::{self, Debug};
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::domain::DomainError;

/// Reduces a lower-case token to its canonical stem
pub trait Stemmer: Send + Sync + Debug {
    fn stem(&self, token: &str) -> String;
}

/// English Snowball (Porter2) stemmer
pub struct SnowballStemmer {
    inner: rust_stemmers::Stemmer,
}

impl SnowballStemmer {
    pub fn english() -> Self {
        Self {
            inner: rust_stemmers::Stemmer::create(rust_stemmers::Algorithm::English),
        }
    }
}

impl Debug for SnowballStemmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowballStemmer")
            .field("algorithm", &"english")
            .finish()
    }
}

impl Stemmer for SnowballStemmer {
    fn stem(&self, token: &str) -> String {
        self.inner.stem(token).into_owned()
    }
}

/// Leaves tokens untouched
#[derive(Debug, Clone, Default)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem(&self, token: &str) -> String {
        token.to_string()
    }
}

/// Stemmer selection exposed through configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemmerKind {
    #[default]
    English,
    None,
}

impl StemmerKind {
    pub fn build(self) -> Arc<dyn Stemmer> {
        match self {
            StemmerKind::English => Arc::new(SnowballStemmer::english()),
            StemmerKind::None => Arc::new(IdentityStemmer),
        }
    }
}

impl FromStr for StemmerKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "english" | "snowball" | "porter" => Ok(StemmerKind::English),
            "none" | "identity" => Ok(StemmerKind::None),
            _ => Err(DomainError::configuration(format!(
                "Unknown stemmer: {}. Valid stemmers: english, none",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowball_reduces_plurals() {
        let stemmer = SnowballStemmer::english();
        assert_eq!(stemmer.stem("attacks"), "attack");
        assert_eq!(stemmer.stem("defenses"), "defens");
    }

    #[test]
    fn test_snowball_is_deterministic() {
        let stemmer = SnowballStemmer::english();
        assert_eq!(stemmer.stem("simulation"), stemmer.stem("simulation"));
    }

    #[test]
    fn test_identity_stemmer() {
        assert_eq!(IdentityStemmer.stem("defenses"), "defenses");
    }

    #[test]
    fn test_stemmer_kind_from_str() {
        assert_eq!("english".parse::<StemmerKind>().unwrap(), StemmerKind::English);
        assert_eq!("NONE".parse::<StemmerKind>().unwrap(), StemmerKind::None);
        assert!("latin".parse::<StemmerKind>().is_err());
    }
}
