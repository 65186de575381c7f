use async_trait::async_trait;
use std::fmt::Debug;
use std::pin::Pin;
use futures::Stream;

use super::GenerationRequest;
use crate::domain::DomainError;

/// Stream of text chunks produced by a backend
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, DomainError>> + Send>>;

/// Trait for generative backends (Ollama, test doubles, ...)
///
/// A stream is finite and cannot be restarted. An `Err` item ends the
/// generation; anything yielded before it has already been produced.
#[async_trait]
pub trait GenerativeBackend: Send + Sync + Debug {
    /// Start generating a response for the request
    async fn generate(&self, request: GenerationRequest) -> Result<TextStream, DomainError>;

    /// Release whatever the backend holds loaded for this client
    async fn unload(&self) -> Result<(), DomainError> {
        Ok(())
    }

    /// Get the backend name
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use futures::stream;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// One scripted generation
    #[derive(Debug, Clone)]
    pub enum Script {
        Chunks(Vec<String>),
        FailMidStream(Vec<String>, String),
        FailToStart(String),
    }

    /// Scripted backend that replays queued generations in order
    ///
    /// Once the queue is empty it keeps answering with the fallback script.
    #[derive(Debug)]
    pub struct MockBackend {
        scripts: Mutex<VecDeque<Script>>,
        fallback: Script,
        requests: Mutex<Vec<GenerationRequest>>,
        calls: AtomicUsize,
        unloads: AtomicUsize,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self {
                scripts: Mutex::new(VecDeque::new()),
                fallback: Script::Chunks(Vec::new()),
                requests: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                unloads: AtomicUsize::new(0),
            }
        }

        pub fn with_chunks(self, chunks: &[&str]) -> Self {
            self.push(Script::Chunks(chunks.iter().map(|c| c.to_string()).collect()))
        }

        pub fn with_failure_after(self, chunks: &[&str], error: impl Into<String>) -> Self {
            self.push(Script::FailMidStream(
                chunks.iter().map(|c| c.to_string()).collect(),
                error.into(),
            ))
        }

        pub fn with_start_failure(self, error: impl Into<String>) -> Self {
            self.push(Script::FailToStart(error.into()))
        }

        pub fn with_fallback_chunks(mut self, chunks: &[&str]) -> Self {
            self.fallback = Script::Chunks(chunks.iter().map(|c| c.to_string()).collect());
            self
        }

        fn push(self, script: Script) -> Self {
            self.scripts.lock().unwrap().push_back(script);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn unloads(&self) -> usize {
            self.unloads.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl GenerativeBackend for MockBackend {
        async fn generate(&self, request: GenerationRequest) -> Result<TextStream, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);

            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());

            let items: Vec<Result<String, DomainError>> = match script {
                Script::Chunks(chunks) => chunks.into_iter().map(Ok).collect(),
                Script::FailMidStream(chunks, error) => chunks
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(DomainError::backend("mock", error))))
                    .collect(),
                Script::FailToStart(error) => {
                    return Err(DomainError::backend("mock", error));
                }
            };

            Ok(Box::pin(stream::iter(items)))
        }

        async fn unload(&self) -> Result<(), DomainError> {
            self.unloads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "mock"
        }
    }
}
