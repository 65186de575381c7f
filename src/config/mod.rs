//! Application configuration

mod app_config;
pub mod prompts;

pub use app_config::{
    AppConfig, AssistantConfig, BackendConfig, CacheConfig, ExtractorConfig, LogFormat,
    LoggingConfig, PromptsConfig, RefreshConfig, SimulationConfig, MEMORY_STORE,
};
