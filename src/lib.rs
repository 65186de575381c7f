//! intent-memo
//!
//! A memoizing response layer for a conversational assistant:
//! - Intent extraction and query fingerprinting
//! - Recency- and frequency-bounded caches
//! - Serve-from-cache with background refresh
//! - JSON snapshot persistence

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;

use crate::config::prompts::{render, CENSORED_NOTICE, UNCENSORED_NOTICE};
use domain::intent::{IntentExtractor, QueryNormalizer, ENGLISH_STOP_WORDS};
use domain::{CommandRules, GenerativeBackend, SnapshotStore};
use infrastructure::llm::{HttpClient, OllamaBackend, OllamaOptions};
use infrastructure::persistence::{InMemorySnapshotStore, JsonFileStore};
use infrastructure::services::{MemoizationOrchestrator, OrchestratorSettings};
use tracing::info;

/// Create the orchestrator with all collaborators built from configuration
pub async fn create_orchestrator(config: &AppConfig) -> anyhow::Result<MemoizationOrchestrator> {
    let backend = create_backend(config)?;
    let store = create_snapshot_store(config);

    let orchestrator = MemoizationOrchestrator::builder(backend, store)
        .fingerprint_capacity(config.cache.fingerprint_capacity)
        .intent_capacity(config.cache.intent_capacity)
        .max_variants(config.cache.max_variants)
        .extractor(create_extractor(config))
        .normalizer(QueryNormalizer::new(config.extractor.replace_number_words))
        .rules(CommandRules::default())
        .settings(create_settings(config))
        .background(config.refresh.queue_capacity, config.refresh.concurrency)
        .simulation(config.simulation.enabled)
        .build()
        .await?;

    Ok(orchestrator)
}

/// Create the Ollama backend
pub fn create_backend(config: &AppConfig) -> anyhow::Result<Arc<dyn GenerativeBackend>> {
    let backend_config = &config.backend;
    let client = HttpClient::with_timeout(backend_config.timeout())?;

    info!(
        url = %backend_config.base_url,
        model = %backend_config.model,
        "Using Ollama backend"
    );

    let backend = OllamaBackend::with_base_url(
        client,
        backend_config.model.clone(),
        backend_config.base_url.clone(),
    )
    .with_keep_alive(backend_config.keep_alive.clone())
    .with_options(OllamaOptions {
        temperature: backend_config.temperature,
        top_k: backend_config.top_k,
        top_p: backend_config.top_p,
        repeat_penalty: backend_config.repeat_penalty,
        num_ctx: backend_config.num_ctx,
    });

    Ok(Arc::new(backend))
}

/// Create the snapshot store named by `cache.store_path`
pub fn create_snapshot_store(config: &AppConfig) -> Arc<dyn SnapshotStore> {
    if config.uses_memory_store() {
        info!("Cache snapshot kept in memory only");
        return Arc::new(InMemorySnapshotStore::new());
    }

    Arc::new(JsonFileStore::new(config.cache.store_path.clone()))
}

fn create_extractor(config: &AppConfig) -> IntentExtractor {
    let extractor_config = &config.extractor;
    let stemmer = extractor_config.stemmer.build();

    match &extractor_config.stop_words {
        Some(stop_words) => {
            IntentExtractor::new(stop_words, &extractor_config.filler_words, stemmer)
        }
        None => IntentExtractor::new(
            ENGLISH_STOP_WORDS.iter().copied(),
            &extractor_config.filler_words,
            stemmer,
        ),
    }
}

fn create_settings(config: &AppConfig) -> OrchestratorSettings {
    let name = &config.assistant.name;

    OrchestratorSettings {
        min_variants: config.cache.min_variants,
        fallback_phrase: config.assistant.fallback_phrase.clone(),
        help_text: config.assistant.help_text.clone(),
        general_prompt: render(&config.prompts.general, name),
        uncensored_prompt: render(&config.prompts.uncensored, name),
        simulation_prompt: render(&config.prompts.simulation, name),
        uncensored_notice: render(UNCENSORED_NOTICE, name),
        censored_notice: render(CENSORED_NOTICE, name),
        ..OrchestratorSettings::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MEMORY_STORE;
    use std::path::PathBuf;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.cache.store_path = PathBuf::from(MEMORY_STORE);
        config
    }

    #[tokio::test]
    async fn test_create_orchestrator_from_defaults() {
        let orchestrator = create_orchestrator(&memory_config()).await.unwrap();
        let stats = orchestrator.stats().unwrap();

        assert_eq!(stats.fingerprint_capacity, 1000);
        assert_eq!(stats.intent_capacity, 5000);
        assert!(!stats.simulation);
    }

    #[tokio::test]
    async fn test_simulation_flag_is_applied() {
        let mut config = memory_config();
        config.simulation.enabled = true;

        let orchestrator = create_orchestrator(&config).await.unwrap();
        assert!(orchestrator.is_simulation());
    }

    #[test]
    fn test_settings_render_assistant_name() {
        let mut config = AppConfig::default();
        config.assistant.name = "Warden".to_string();

        let settings = create_settings(&config);
        assert!(settings.general_prompt.contains("Warden"));
        assert!(settings.simulation_prompt.contains("Warden"));
        assert!(settings.uncensored_prompt.contains("Warden"));
        assert_eq!(settings.censored_notice, "Warden has been censored.");
        assert_eq!(settings.min_variants, 2);
    }

    #[test]
    fn test_custom_stop_words_replace_defaults() {
        let mut config = AppConfig::default();
        config.extractor.stop_words = Some(vec!["phishing".to_string()]);
        config.extractor.stemmer = domain::intent::StemmerKind::None;

        let extractor = create_extractor(&config);
        assert_eq!(extractor.extract("what is phishing").as_str(), "what.is");
    }
}
