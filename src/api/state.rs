//! Application state for shared services

use std::sync::Arc;

use crate::domain::cache::Cache;
use crate::domain::judgment::JudgmentRepository;
use crate::domain::DomainError;
use crate::infrastructure::ratelimit::RateLimiter;
use crate::infrastructure::services::{JudgeOutcome, JudgeService};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub judge_service: Arc<dyn JudgeServiceTrait>,
    pub rate_limiter: Arc<RateLimiter>,
    pub cache: Arc<dyn Cache>,
    pub judgments: Arc<dyn JudgmentRepository>,
    pub max_bulk_pairs: usize,
}

/// Trait for judgment service operations
#[async_trait::async_trait]
pub trait JudgeServiceTrait: Send + Sync {
    async fn judge(&self, sentence1: &str, sentence2: &str) -> Result<JudgeOutcome, DomainError>;
    async fn judge_bulk(
        &self,
        pairs: &[(String, String)],
    ) -> Result<Vec<JudgeOutcome>, DomainError>;
}

#[async_trait::async_trait]
impl JudgeServiceTrait for JudgeService {
    async fn judge(&self, sentence1: &str, sentence2: &str) -> Result<JudgeOutcome, DomainError> {
        JudgeService::judge(self, sentence1, sentence2).await
    }

    async fn judge_bulk(
        &self,
        pairs: &[(String, String)],
    ) -> Result<Vec<JudgeOutcome>, DomainError> {
        JudgeService::judge_bulk(self, pairs).await
    }
}

impl AppState {
    /// Create new application state with provided services
    pub fn new(
        judge_service: Arc<dyn JudgeServiceTrait>,
        rate_limiter: Arc<RateLimiter>,
        cache: Arc<dyn Cache>,
        judgments: Arc<dyn JudgmentRepository>,
        max_bulk_pairs: usize,
    ) -> Self {
        Self {
            judge_service,
            rate_limiter,
            cache,
            judgments,
            max_bulk_pairs,
        }
    }
}
