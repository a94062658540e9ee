//! Embedding provider trait definition
//!
//! The similarity oracle is an injected dependency behind this trait. It is
//! constructed once at startup and passed to the orchestrator; tests swap in
//! the deterministic mock.

use async_trait::async_trait;
use std::fmt::Debug;

use super::Embedding;
use crate::domain::DomainError;

/// Trait for embedding providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate one embedding per input text, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
