//! Generative backend domain models and traits

mod provider;
mod request;

pub use provider::{GenerativeBackend, TextStream};
pub use request::GenerationRequest;

#[cfg(test)]
pub use provider::mock::MockBackend;
