use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Backend error: {backend} - {message}")]
    Backend { backend: String, message: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error() {
        let error = DomainError::backend("ollama", "connection refused");
        assert_eq!(error.to_string(), "Backend error: ollama - connection refused");
    }

    #[test]
    fn test_persistence_error() {
        let error = DomainError::persistence("expected value at line 1");
        assert_eq!(
            error.to_string(),
            "Persistence error: expected value at line 1"
        );
    }

    #[test]
    fn test_cache_error() {
        let error = DomainError::cache("lock poisoned");
        assert_eq!(error.to_string(), "Cache error: lock poisoned");
    }
}
