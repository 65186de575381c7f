//! Query understanding - fingerprints, normalization and intent labels

mod extractor;
mod fingerprint;
mod label;
mod normalizer;
mod stemmer;
mod stop_words;

pub use extractor::IntentExtractor;
pub use fingerprint::QueryFingerprint;
pub use label::{IntentLabel, LABEL_SEPARATOR};
pub use normalizer::QueryNormalizer;
pub use stemmer::{IdentityStemmer, SnowballStemmer, Stemmer, StemmerKind};
pub use stop_words::{DEFAULT_FILLER_WORDS, ENGLISH_STOP_WORDS};
