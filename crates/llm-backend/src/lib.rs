//! llm-backend: text-completion backends for command interpretation
//!
//! Both the displacement interpreter and the confirmation composer talk to a
//! language-understanding service through the [`CompletionBackend`] trait. The
//! default build ships a scripted backend so that everything compiles and
//! tests without network access; the `http` feature adds an
//! OpenAI-compatible chat-completions client.

mod types;
pub use types::{BackendConfig, ChatMessage, Completion, CompletionRequest, Role, TokenUsage};

mod error;
pub use error::{BackendError, Result};

mod traits;
pub use traits::{BackendMetadata, CompletionBackend};

#[cfg(feature = "mock")]
mod scripted;
#[cfg(feature = "mock")]
pub use scripted::{ScriptedBackend, ScriptedFailure};

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::HttpBackend;

use std::sync::Arc;

/// Create a backend instance based on configuration
pub fn create_backend(config: BackendConfig) -> Result<Arc<dyn CompletionBackend>> {
    match config.backend_type.as_str() {
        #[cfg(feature = "http")]
        "http" => {
            let backend = http::HttpBackend::new(config)?;
            tracing::info!(
                "Completion backend ready: {}",
                backend.metadata().name
            );
            Ok(Arc::new(backend))
        }
        other => Err(BackendError::Unsupported(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_backend_type_is_rejected() {
        let config = BackendConfig {
            backend_type: "carrier-pigeon".to_string(),
            ..BackendConfig::default()
        };
        match create_backend(config) {
            Err(BackendError::Unsupported(name)) => assert_eq!(name, "carrier-pigeon"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("backend should not have been created"),
        }
    }
}
