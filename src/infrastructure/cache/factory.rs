//! Cache factory for runtime backend selection

use std::sync::Arc;
use std::time::Duration;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};

/// Supported cache backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// In-memory cache using moka (single-instance deployments only)
    #[default]
    InMemory,
    /// Redis cache, shared across worker instances
    Redis,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::InMemory => write!(f, "in_memory"),
            CacheBackend::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheBackend::InMemory),
            "redis" => Ok(CacheBackend::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache backend: {}. Valid backends: in_memory, redis",
                s
            ))),
        }
    }
}

/// Configuration for the cache factory
#[derive(Debug, Clone)]
pub struct CacheFactoryConfig {
    pub backend: CacheBackend,
    /// Redis URL (required for the Redis backend)
    pub redis_url: Option<String>,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Eviction upper bound for the in-memory backend
    pub default_ttl: Duration,
    /// Maximum capacity (in-memory only)
    pub max_capacity: u64,
}

impl Default for CacheFactoryConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::InMemory,
            redis_url: None,
            key_prefix: None,
            default_ttl: Duration::from_secs(3600),
            max_capacity: 10_000,
        }
    }
}

/// Build the shared cache from configuration
pub async fn build_cache(config: CacheFactoryConfig) -> Result<Arc<dyn Cache>, DomainError> {
    match config.backend {
        CacheBackend::InMemory => {
            let cache = InMemoryCache::with_config(
                InMemoryCacheConfig::default()
                    .with_max_capacity(config.max_capacity)
                    .with_default_ttl(config.default_ttl),
            );
            Ok(Arc::new(cache))
        }
        CacheBackend::Redis => {
            let url = config.redis_url.ok_or_else(|| {
                DomainError::configuration("Redis cache backend requires cache.redis_url")
            })?;

            let mut redis_config = RedisCacheConfig::new(url);
            if let Some(prefix) = config.key_prefix {
                redis_config = redis_config.with_key_prefix(prefix);
            }

            let cache = RedisCache::new(redis_config).await?;
            Ok(Arc::new(cache))
        }
    }
}
