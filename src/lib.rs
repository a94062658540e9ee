//! Entail Judge API
//!
//! Sentence entailment judgment service backed by embedding similarity.
//! Judgments are memoized in a TTL cache, persisted through a
//! contention-safe upsert, and served behind a per-client rate limit.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use api::state::AppState;
use domain::judgment::JudgmentRepository;
use domain::DomainError;
use infrastructure::cache::{build_cache, CacheFactoryConfig};
use infrastructure::embedding::{
    HttpClient, OpenAiEmbeddingProvider, DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_BASE_URL,
};
use infrastructure::judgment::{
    InMemoryJudgmentRepository, JudgmentPersister, PersisterConfig, PostgresJudgmentRepository,
};
use infrastructure::ratelimit::{RateLimiter, RateLimiterConfig};
use infrastructure::services::{JudgeService, JudgeServiceConfig};

/// Wire up the full application state from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let cache = build_cache(CacheFactoryConfig {
        backend: config.cache.backend.parse()?,
        redis_url: config.cache.redis_url.clone(),
        key_prefix: config.cache.key_prefix.clone(),
        default_ttl: Duration::from_secs(config.cache.default_ttl_secs),
        max_capacity: config.cache.max_capacity,
    })
    .await?;

    let judgments = build_judgment_repository(config).await?;

    let http_client =
        HttpClient::with_timeout(Duration::from_secs(config.embedding.timeout_secs))?;
    let api_key = config.embedding.api_key.clone().ok_or_else(|| {
        DomainError::configuration("embedding.api_key is required (APP__EMBEDDING__API_KEY)")
    })?;
    let base_url = config
        .embedding
        .base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
    let model = config
        .embedding
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
    let provider = Arc::new(OpenAiEmbeddingProvider::with_options(
        http_client,
        api_key,
        base_url,
        model,
    ));

    let persister = Arc::new(JudgmentPersister::new(
        judgments.clone(),
        PersisterConfig {
            max_attempts: config.persistence.max_attempts,
            base_backoff: Duration::from_millis(config.persistence.base_backoff_ms),
            max_elapsed: config.persistence.max_elapsed_ms.map(Duration::from_millis),
        },
    ));

    let judge_service = Arc::new(JudgeService::new(
        cache.clone(),
        provider,
        persister,
        JudgeServiceConfig {
            entail_threshold: config.judge.entail_threshold,
            cache_ttl: Duration::from_secs(config.judge.cache_ttl_secs),
            bulk_cache_enabled: config.judge.bulk_cache_enabled,
        },
    ));

    let rate_limiter = Arc::new(RateLimiter::new(
        cache.clone(),
        RateLimiterConfig {
            max_requests: config.rate_limit.max_requests,
            window: Duration::from_secs(config.rate_limit.window_secs),
            strategy: config.rate_limit.strategy.parse()?,
            fail_open: config.rate_limit.fail_open,
        },
    ));

    Ok(AppState::new(
        judge_service,
        rate_limiter,
        cache,
        judgments,
        config.judge.max_bulk_pairs,
    ))
}

async fn build_judgment_repository(
    config: &AppConfig,
) -> anyhow::Result<Arc<dyn JudgmentRepository>> {
    match config.database.backend.as_str() {
        "postgres" => {
            let url = config.database.url.as_deref().ok_or_else(|| {
                DomainError::configuration("database.url is required for the postgres backend")
            })?;

            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(url)
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Connected to postgres and applied migrations");

            Ok(Arc::new(PostgresJudgmentRepository::new(pool)))
        }
        "memory" | "in_memory" | "inmemory" => Ok(Arc::new(InMemoryJudgmentRepository::new())),
        other => Err(DomainError::configuration(format!(
            "Unknown database backend: {}. Valid backends: memory, postgres",
            other
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::cache::Cache;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.embedding.api_key = Some("test-key".to_string());
        config
    }

    #[tokio::test]
    async fn test_create_app_state_with_memory_backends() {
        let state = create_app_state(&memory_config()).await.unwrap();

        assert_eq!(state.max_bulk_pairs, 100);
        assert_eq!(state.judgments.count().await.unwrap(), 0);
        assert_eq!(state.cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_app_state_requires_api_key() {
        let config = AppConfig::default();

        let result = create_app_state(&config).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unknown_database_backend_is_rejected() {
        let mut config = memory_config();
        config.database.backend = "mysql".to_string();

        let result = create_app_state(&config).await;
        assert!(result.is_err());
    }
}
