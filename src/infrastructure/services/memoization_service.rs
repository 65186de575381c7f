//! Intent-keyed response memoization around a generative backend

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use super::background::{BackgroundQueue, DEFAULT_CONCURRENCY, DEFAULT_QUEUE_CAPACITY};
use crate::config::prompts::{
    render, CENSORED_NOTICE, DEFAULT_ASSISTANT_NAME, DEFAULT_FALLBACK_PHRASE,
    DEFAULT_GENERAL_PROMPT, DEFAULT_HELP_TEXT, DEFAULT_SIMULATION_PROMPT,
    DEFAULT_UNCENSORED_PROMPT, UNCENSORED_NOTICE,
};
use crate::domain::cache::{FingerprintCache, IntentResponseStore};
use crate::domain::command::{CommandAction, CommandRules, SessionMode};
use crate::domain::intent::{IntentExtractor, IntentLabel, QueryFingerprint, QueryNormalizer};
use crate::domain::persistence::SnapshotStore;
use crate::domain::text::{select_response, split_sentences};
use crate::domain::{DomainError, GenerationRequest, GenerativeBackend};
use crate::infrastructure::persistence::CachePersistence;

pub const DEFAULT_FINGERPRINT_CAPACITY: usize = 1000;
pub const DEFAULT_INTENT_CAPACITY: usize = 5000;

/// Behavioural knobs of the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Distinct cached responses an intent needs before it is served from cache
    pub min_variants: usize,
    pub fallback_phrase: String,
    pub help_text: String,
    /// System prompt outside simulation mode
    pub general_prompt: String,
    /// System prompt outside simulation mode once uncensored
    pub uncensored_prompt: String,
    /// System prompt in simulation mode
    pub simulation_prompt: String,
    pub uncensored_notice: String,
    pub censored_notice: String,
    /// Segments buffered between the responder and a slow consumer
    pub stream_buffer: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            min_variants: 2,
            fallback_phrase: DEFAULT_FALLBACK_PHRASE.to_string(),
            help_text: DEFAULT_HELP_TEXT.to_string(),
            general_prompt: render(DEFAULT_GENERAL_PROMPT, DEFAULT_ASSISTANT_NAME),
            uncensored_prompt: render(DEFAULT_UNCENSORED_PROMPT, DEFAULT_ASSISTANT_NAME),
            simulation_prompt: render(DEFAULT_SIMULATION_PROMPT, DEFAULT_ASSISTANT_NAME),
            uncensored_notice: render(UNCENSORED_NOTICE, DEFAULT_ASSISTANT_NAME),
            censored_notice: render(CENSORED_NOTICE, DEFAULT_ASSISTANT_NAME),
            stream_buffer: 32,
        }
    }
}

/// Occupancy of both caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub fingerprints: usize,
    pub fingerprint_capacity: usize,
    pub intents: usize,
    pub intent_capacity: usize,
    pub pending_jobs: usize,
    pub simulation: bool,
    pub uncensored: bool,
}

/// What the caches and the backend see of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAnalysis {
    /// Query with number words rewritten; this is what the backend receives
    pub text: String,
    pub fingerprint: QueryFingerprint,
    pub intent: IntentLabel,
}

/// System prompt a generation runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Persona {
    General,
    Uncensored,
    Simulation,
}

/// Builder for [`MemoizationOrchestrator`]
#[derive(Debug)]
pub struct OrchestratorBuilder {
    backend: Arc<dyn GenerativeBackend>,
    store: Arc<dyn SnapshotStore>,
    fingerprint_capacity: usize,
    intent_capacity: usize,
    max_variants: Option<usize>,
    extractor: IntentExtractor,
    normalizer: QueryNormalizer,
    rules: CommandRules,
    settings: OrchestratorSettings,
    queue_capacity: usize,
    concurrency: usize,
    simulation: bool,
}

impl OrchestratorBuilder {
    pub fn fingerprint_capacity(mut self, capacity: usize) -> Self {
        self.fingerprint_capacity = capacity;
        self
    }

    pub fn intent_capacity(mut self, capacity: usize) -> Self {
        self.intent_capacity = capacity;
        self
    }

    /// Per-intent variant cap; `None` keeps every distinct response
    pub fn max_variants(mut self, max_variants: Option<usize>) -> Self {
        self.max_variants = max_variants;
        self
    }

    pub fn extractor(mut self, extractor: IntentExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn normalizer(mut self, normalizer: QueryNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn rules(mut self, rules: CommandRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn background(mut self, queue_capacity: usize, concurrency: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self.concurrency = concurrency;
        self
    }

    pub fn simulation(mut self, enabled: bool) -> Self {
        self.simulation = enabled;
        self
    }

    /// Loads persisted state and starts the background queue
    ///
    /// Fails if the stored snapshot is malformed.
    pub async fn build(self) -> Result<MemoizationOrchestrator, DomainError> {
        let fingerprints = FingerprintCache::new(self.fingerprint_capacity);
        let intents =
            IntentResponseStore::new(self.intent_capacity).with_max_variants(self.max_variants);
        let persistence = CachePersistence::new(self.store);

        persistence.load_into(&fingerprints, &intents).await?;

        let (fingerprint_count, intent_count) = (fingerprints.len()?, intents.len()?);
        info!(
            backend = self.backend.backend_name(),
            store = %persistence.location(),
            fingerprints = fingerprint_count,
            intents = intent_count,
            "Memoization orchestrator ready"
        );

        Ok(MemoizationOrchestrator {
            inner: Arc::new(Inner {
                fingerprints,
                intents,
                persistence,
                backend: self.backend,
                extractor: self.extractor,
                normalizer: self.normalizer,
                rules: self.rules,
                queue: BackgroundQueue::new(self.queue_capacity, self.concurrency),
                simulation: AtomicBool::new(self.simulation),
                uncensored: AtomicBool::new(false),
                settings: self.settings,
            }),
        })
    }
}

/// Answers queries from the caches when possible and from the backend
/// otherwise, refreshing and persisting the caches in the background
///
/// Cloning is cheap; clones share all state.
#[derive(Debug, Clone)]
pub struct MemoizationOrchestrator {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    fingerprints: FingerprintCache,
    intents: IntentResponseStore,
    persistence: CachePersistence,
    backend: Arc<dyn GenerativeBackend>,
    extractor: IntentExtractor,
    normalizer: QueryNormalizer,
    rules: CommandRules,
    queue: BackgroundQueue,
    simulation: AtomicBool,
    uncensored: AtomicBool,
    settings: OrchestratorSettings,
}

/// How a live generation ended
struct Generation {
    text: String,
    failed: bool,
}

impl MemoizationOrchestrator {
    pub fn builder(
        backend: Arc<dyn GenerativeBackend>,
        store: Arc<dyn SnapshotStore>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder {
            backend,
            store,
            fingerprint_capacity: DEFAULT_FINGERPRINT_CAPACITY,
            intent_capacity: DEFAULT_INTENT_CAPACITY,
            max_variants: None,
            extractor: IntentExtractor::default(),
            normalizer: QueryNormalizer::default(),
            rules: CommandRules::default(),
            settings: OrchestratorSettings::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            concurrency: DEFAULT_CONCURRENCY,
            simulation: false,
        }
    }

    /// Answers a query as a stream of text segments in production order
    ///
    /// Must be called inside a tokio runtime. Dropping the stream early
    /// does not cancel memoization of a live answer.
    pub fn handle(&self, query: impl Into<String>) -> ReceiverStream<String> {
        let (tx, rx) = mpsc::channel(self.inner.settings.stream_buffer.max(1));
        let inner = self.inner.clone();
        let query = query.into();

        tokio::spawn(async move {
            inner.respond(query, tx).await;
        });

        ReceiverStream::new(rx)
    }

    /// Rewritten text, fingerprint and intent of a query
    pub fn analyze(&self, query: &str) -> QueryAnalysis {
        self.inner.analyze(query)
    }

    pub fn is_simulation(&self) -> bool {
        self.inner.simulation.load(Ordering::SeqCst)
    }

    pub fn is_uncensored(&self) -> bool {
        self.inner.uncensored.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> Result<CacheStats, DomainError> {
        let inner = &self.inner;
        Ok(CacheStats {
            fingerprints: inner.fingerprints.len()?,
            fingerprint_capacity: inner.fingerprints.capacity(),
            intents: inner.intents.len()?,
            intent_capacity: inner.intents.capacity(),
            pending_jobs: inner.queue.outstanding(),
            simulation: self.is_simulation(),
            uncensored: self.is_uncensored(),
        })
    }

    /// Waits for background refresh and store jobs; false on timeout
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        self.inner.queue.wait_idle(timeout).await
    }

    /// Flushes both caches to the store
    pub async fn flush(&self) -> Result<(), DomainError> {
        self.inner
            .persistence
            .flush(&self.inner.fingerprints, &self.inner.intents)
            .await
    }

    /// Drains background work (up to `timeout`), performs the final flush
    /// and asks the backend to unload its model
    ///
    /// A failed unload is logged; a failed flush is returned.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), DomainError> {
        if !self.wait_idle(timeout).await {
            warn!(
                pending = self.inner.queue.outstanding(),
                "Background jobs still running at shutdown"
            );
        }
        let flushed = self.flush().await;

        if let Err(e) = self.inner.backend.unload().await {
            warn!(
                backend = self.inner.backend.backend_name(),
                error = %e,
                "Failed to unload model"
            );
        }

        flushed
    }
}

impl Inner {
    fn analyze(&self, query: &str) -> QueryAnalysis {
        let text = self.normalizer.rewrite(query);
        let fingerprint = QueryFingerprint::of(&self.normalizer.fingerprint_input(&text));
        let intent = self.extractor.extract(&text);
        QueryAnalysis {
            text,
            fingerprint,
            intent,
        }
    }

    fn mode(&self) -> SessionMode {
        SessionMode {
            simulation: self.simulation.load(Ordering::SeqCst),
            uncensored: self.uncensored.load(Ordering::SeqCst),
        }
    }

    /// Persona for a generation outside simulation
    fn conversational_persona(&self) -> Persona {
        if self.uncensored.load(Ordering::SeqCst) {
            Persona::Uncensored
        } else {
            Persona::General
        }
    }

    async fn respond(self: Arc<Self>, query: String, tx: mpsc::Sender<String>) {
        let QueryAnalysis {
            text: query,
            fingerprint,
            intent,
        } = self.analyze(&query);
        let mode = self.mode();
        let mut simulating = mode.simulation;

        debug!(
            %fingerprint,
            %intent,
            simulating,
            uncensored = mode.uncensored,
            "Handling query"
        );

        match self.rules.evaluate(&intent, mode) {
            Some(CommandAction::ShowHelp) => {
                let _ = tx.send(self.settings.help_text.clone()).await;
                return;
            }
            Some(CommandAction::EnableUncensored) => {
                info!(%intent, "Switching to uncensored persona");
                self.uncensored.store(true, Ordering::SeqCst);
                let _ = tx.send(self.settings.uncensored_notice.clone()).await;
                return;
            }
            Some(CommandAction::DisableUncensored) => {
                info!(%intent, "Switching back to default persona");
                self.uncensored.store(false, Ordering::SeqCst);
                let _ = tx.send(self.settings.censored_notice.clone()).await;
                return;
            }
            Some(CommandAction::StartSimulation) => {
                info!(%intent, "Entering simulation mode");
                self.simulation.store(true, Ordering::SeqCst);
                simulating = true;
            }
            Some(CommandAction::StopSimulation) => {
                info!(%intent, "Leaving simulation mode");
                self.simulation.store(false, Ordering::SeqCst);
                self.answer_live(&query, Persona::Simulation, &tx).await;
                return;
            }
            None => {}
        }

        if !simulating {
            match self.pick_cached(&fingerprint) {
                Ok(Some((cached_intent, response))) => {
                    self.serve_cached(query, cached_intent, response, &tx).await;
                    return;
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Cache lookup failed, generating instead"),
            }
        }

        let persona = if simulating {
            Persona::Simulation
        } else {
            self.conversational_persona()
        };
        let generation = self.answer_live(&query, persona, &tx).await;

        if simulating || generation.failed || generation.text.is_empty() {
            return;
        }

        let inner = self.clone();
        self.queue.submit(async move {
            inner.store(fingerprint, intent, generation.text).await;
        });
    }

    /// Chooses a cached response for a fingerprint hit with enough variants
    /// and records it as the last one served
    fn pick_cached(
        &self,
        fingerprint: &QueryFingerprint,
    ) -> Result<Option<(IntentLabel, String)>, DomainError> {
        let Some(intent) = self.fingerprints.intent_for(fingerprint)? else {
            return Ok(None);
        };
        let Some(bucket) = self.intents.bucket(&intent)? else {
            return Ok(None);
        };
        if bucket.len() < self.settings.min_variants {
            debug!(%intent, variants = bucket.len(), "Not enough cached variants");
            return Ok(None);
        }

        let last = self.fingerprints.last_served()?;
        let Some(response) =
            select_response(bucket.responses(), last.as_deref(), &mut rand::thread_rng()).cloned()
        else {
            return Ok(None);
        };

        self.fingerprints.set_last_served(response.clone())?;
        Ok(Some((intent, response)))
    }

    async fn serve_cached(
        self: &Arc<Self>,
        query: String,
        intent: IntentLabel,
        response: String,
        tx: &mpsc::Sender<String>,
    ) {
        debug!(%intent, "Serving cached response");

        for sentence in split_sentences(&response) {
            if tx.send(sentence).await.is_err() {
                break;
            }
        }

        let inner = self.clone();
        self.queue.submit(async move {
            inner.refresh(query, intent).await;
        });
    }

    /// Streams a backend answer to the caller and returns what was produced
    async fn answer_live(
        &self,
        query: &str,
        persona: Persona,
        tx: &mpsc::Sender<String>,
    ) -> Generation {
        let mut chunks: Vec<String> = Vec::new();
        let mut failed = false;
        let mut listening = true;

        match self.backend.generate(self.request_for(query, persona)).await {
            Ok(mut stream) => {
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(chunk) => {
                            let chunk = chunk.trim();
                            if chunk.is_empty() {
                                continue;
                            }
                            if listening && tx.send(chunk.to_string()).await.is_err() {
                                debug!("Caller dropped the stream, finishing generation");
                                listening = false;
                            }
                            chunks.push(chunk.to_string());
                        }
                        Err(e) => {
                            warn!(error = %e, "Generation failed mid-stream");
                            failed = true;
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Generation failed to start");
                failed = true;
            }
        }

        let text = chunks.join(" ");
        if text.is_empty() && listening {
            let _ = tx.send(self.settings.fallback_phrase.clone()).await;
        }

        Generation { text, failed }
    }

    /// Generates without streaming, for background refreshes
    async fn generate_quietly(&self, query: &str) -> Result<String, DomainError> {
        let request = self.request_for(query, self.conversational_persona());
        let mut stream = self.backend.generate(request).await?;
        let mut chunks: Vec<String> = Vec::new();

        while let Some(item) = stream.next().await {
            let chunk = item?;
            let chunk = chunk.trim();
            if !chunk.is_empty() {
                chunks.push(chunk.to_string());
            }
        }

        Ok(chunks.join(" "))
    }

    fn request_for(&self, query: &str, persona: Persona) -> GenerationRequest {
        let system = match persona {
            Persona::General => &self.settings.general_prompt,
            Persona::Uncensored => &self.settings.uncensored_prompt,
            Persona::Simulation => &self.settings.simulation_prompt,
        };
        GenerationRequest::new(query).with_system(system.clone())
    }

    /// Re-runs the backend after a cache hit and merges a new variant
    async fn refresh(&self, query: String, intent: IntentLabel) {
        match self.generate_quietly(&query).await {
            Ok(text) if !text.is_empty() => match self.intents.append(intent.clone(), text) {
                Ok(added) => debug!(%intent, added, "Refreshed cached intent"),
                Err(e) => warn!(%intent, error = %e, "Failed to merge refreshed response"),
            },
            Ok(_) => debug!(%intent, "Refresh produced nothing"),
            Err(e) => warn!(%intent, error = %e, "Refresh generation failed"),
        }

        self.persist().await;
    }

    /// Memoizes a completed live answer
    async fn store(&self, fingerprint: QueryFingerprint, intent: IntentLabel, text: String) {
        if let Err(e) = self.intents.append(intent.clone(), text) {
            warn!(%intent, error = %e, "Failed to store response");
            return;
        }
        if let Err(e) = self.fingerprints.record(&fingerprint, intent.clone()) {
            warn!(%fingerprint, error = %e, "Failed to record fingerprint");
        }

        debug!(%fingerprint, %intent, "Memoized response");
        self.persist().await;
    }

    async fn persist(&self) {
        if let Err(e) = self.persistence.flush(&self.fingerprints, &self.intents).await {
            warn!(error = %e, "Cache flush failed, keeping in-memory state");
        }
    }
}
