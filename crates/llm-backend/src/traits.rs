use crate::{Completion, CompletionRequest, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// A language-understanding service: one instruction-plus-examples request in,
/// one text completion out
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run a single blocking request/response exchange
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;

    /// Get backend metadata
    fn metadata(&self) -> BackendMetadata;
}

#[async_trait]
impl<B: CompletionBackend + ?Sized> CompletionBackend for Arc<B> {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        (**self).complete(request).await
    }

    fn metadata(&self) -> BackendMetadata {
        (**self).metadata()
    }
}

/// Metadata about a backend
#[derive(Debug, Clone)]
pub struct BackendMetadata {
    pub name: String,
    pub model: String,
    pub endpoint: Option<String>,
}
