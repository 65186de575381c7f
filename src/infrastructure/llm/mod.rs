//! Generative backend implementations

mod http_client;
mod ollama;

pub use http_client::{ByteStream, HttpClient, HttpClientTrait};
pub use ollama::{OllamaBackend, OllamaOptions};
