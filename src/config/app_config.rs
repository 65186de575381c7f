use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use super::prompts::{
    DEFAULT_ASSISTANT_NAME, DEFAULT_FALLBACK_PHRASE, DEFAULT_GENERAL_PROMPT, DEFAULT_HELP_TEXT,
    DEFAULT_SIMULATION_PROMPT, DEFAULT_UNCENSORED_PROMPT,
};
use crate::domain::intent::{StemmerKind, DEFAULT_FILLER_WORDS};

/// Store path that selects the in-memory snapshot store
pub const MEMORY_STORE: &str = ":memory:";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub cache: CacheConfig,
    pub extractor: ExtractorConfig,
    pub backend: BackendConfig,
    pub prompts: PromptsConfig,
    pub assistant: AssistantConfig,
    pub refresh: RefreshConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub fingerprint_capacity: usize,
    pub intent_capacity: usize,
    /// Snapshot file, or `:memory:` to keep nothing on disk
    pub store_path: PathBuf,
    pub min_variants: usize,
    /// Caps each intent's bucket, dropping the oldest variant; unbounded when unset
    pub max_variants: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Replaces the built-in English stop-word list when set
    pub stop_words: Option<Vec<String>>,
    pub filler_words: Vec<String>,
    pub stemmer: StemmerKind,
    pub replace_number_words: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub model: String,
    pub keep_alive: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub repeat_penalty: f32,
    pub num_ctx: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub general: String,
    pub uncensored: String,
    pub simulation: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub name: String,
    pub fallback_phrase: String,
    pub help_text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub queue_capacity: usize,
    pub concurrency: usize,
    /// How long the final flush waits for background jobs
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Start in simulation mode
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fingerprint_capacity: 1000,
            intent_capacity: 5000,
            store_path: PathBuf::from("cache.json"),
            min_variants: 2,
            max_variants: None,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            stop_words: None,
            filler_words: DEFAULT_FILLER_WORDS.iter().map(|w| w.to_string()).collect(),
            stemmer: StemmerKind::default(),
            replace_number_words: true,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:1b".to_string(),
            keep_alive: "5m".to_string(),
            timeout_secs: 120,
            temperature: 1.0,
            top_k: 20,
            top_p: 1.0,
            repeat_penalty: 1.2,
            num_ctx: 1024,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            general: DEFAULT_GENERAL_PROMPT.to_string(),
            uncensored: DEFAULT_UNCENSORED_PROMPT.to_string(),
            simulation: DEFAULT_SIMULATION_PROMPT.to_string(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ASSISTANT_NAME.to_string(),
            fallback_phrase: DEFAULT_FALLBACK_PHRASE.to_string(),
            help_text: DEFAULT_HELP_TEXT.to_string(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            concurrency: 4,
            shutdown_timeout_secs: 30,
        }
    }
}

impl RefreshConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn uses_memory_store(&self) -> bool {
        self.cache.store_path.as_os_str() == MEMORY_STORE
    }
}
