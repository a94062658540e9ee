//! Per-client admission control backed by the shared cache
//!
//! Two strategies share one decision surface:
//!
//! - `SlidingWindow` keeps a per-client list of admission timestamps and
//!   prunes it to the trailing window on every check. The read-filter-append-
//!   write sequence is NOT atomic across concurrent callers on the same
//!   client key, so transient over-admission is possible under high
//!   concurrency. The observable contract is "approximately N admissions per
//!   window per client".
//! - `Counter` buckets admissions into fixed sub-windows with the cache's
//!   atomic increment, trading window precision for exact enforcement.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::domain::cache::{Cache, CacheExt};
use crate::domain::DomainError;

/// Rate limiting strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimitStrategy {
    #[default]
    SlidingWindow,
    Counter,
}

impl std::str::FromStr for RateLimitStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sliding_window" | "sliding" => Ok(Self::SlidingWindow),
            "counter" => Ok(Self::Counter),
            _ => Err(DomainError::configuration(format!(
                "Unknown rate limit strategy: {}. Valid strategies: sliding_window, counter",
                s
            ))),
        }
    }
}

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum admissions per window per client
    pub max_requests: u32,
    /// Trailing window length
    pub window: Duration,
    pub strategy: RateLimitStrategy,
    /// Policy when the cache substrate is unavailable: admit with a warning
    /// (open) or surface the cache error (closed)
    pub fail_open: bool,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(1),
            strategy: RateLimitStrategy::default(),
            fail_open: false,
        }
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Remaining admissions in the current window
    pub remaining: u32,
    /// Total limit for the window
    pub limit: u32,
}

/// Per-client rate limiter over the shared cache
#[derive(Debug)]
pub struct RateLimiter {
    cache: Arc<dyn Cache>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    pub fn new(cache: Arc<dyn Cache>, config: RateLimiterConfig) -> Self {
        Self { cache, config }
    }

    /// Check and record an admission for a client.
    ///
    /// Returns the decision, or the underlying cache error when the limiter
    /// is configured fail-closed and the substrate is unavailable.
    pub async fn check(&self, client_id: &str) -> Result<RateLimitDecision, DomainError> {
        let result = match self.config.strategy {
            RateLimitStrategy::SlidingWindow => self.check_sliding_window(client_id).await,
            RateLimitStrategy::Counter => self.check_counter(client_id).await,
        };

        match result {
            Ok(decision) => Ok(decision),
            Err(e) if e.is_cache_error() && self.config.fail_open => {
                warn!(
                    client_id = %client_id,
                    error = %e,
                    "Rate limit cache unavailable, admitting (fail-open)"
                );
                Ok(RateLimitDecision {
                    allowed: true,
                    remaining: 0,
                    limit: self.config.max_requests,
                })
            }
            Err(e) => Err(e),
        }
    }

    fn window_key(client_id: &str) -> String {
        format!("ratelimit:{}", client_id)
    }

    fn now_epoch_secs() -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }

    async fn check_sliding_window(
        &self,
        client_id: &str,
    ) -> Result<RateLimitDecision, DomainError> {
        let key = Self::window_key(client_id);
        let now = Self::now_epoch_secs();
        let window_secs = self.config.window.as_secs_f64();

        let timestamps: Vec<f64> = self.cache.get(&key).await?.unwrap_or_default();
        let mut timestamps: Vec<f64> = timestamps
            .into_iter()
            .filter(|t| now - t < window_secs)
            .collect();

        if timestamps.len() >= self.config.max_requests as usize {
            // no write: a rejected call leaves the window unchanged
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
                limit: self.config.max_requests,
            });
        }

        timestamps.push(now);
        let used = timestamps.len() as u32;
        self.cache.set(&key, &timestamps, self.config.window).await?;

        Ok(RateLimitDecision {
            allowed: true,
            remaining: self.config.max_requests - used,
            limit: self.config.max_requests,
        })
    }

    async fn check_counter(&self, client_id: &str) -> Result<RateLimitDecision, DomainError> {
        let window_secs = self.config.window.as_secs().max(1);
        let bucket = Self::now_epoch_secs() as u64 / window_secs;
        let key = format!("{}:{}", Self::window_key(client_id), bucket);

        let count = self.cache.increment(&key, 1).await?;

        if count == 1 {
            // first admission in the bucket owns setting its expiry
            self.cache.expire(&key, self.config.window).await?;
        }

        if count > self.config.max_requests as i64 {
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
                limit: self.config.max_requests,
            });
        }

        Ok(RateLimitDecision {
            allowed: true,
            remaining: self.config.max_requests - count as u32,
            limit: self.config.max_requests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;

    fn limiter_with(cache: MockCache, config: RateLimiterConfig) -> RateLimiter {
        RateLimiter::new(Arc::new(cache), config)
    }

    #[tokio::test]
    async fn test_admits_up_to_limit_then_rejects() {
        let limiter = limiter_with(MockCache::new(), RateLimiterConfig::default());

        for i in 0..5 {
            let decision = limiter.check("10.0.0.1").await.unwrap();
            assert!(decision.allowed, "request {} should be admitted", i + 1);
        }

        let decision = limiter.check("10.0.0.1").await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let limiter = limiter_with(
            MockCache::new(),
            RateLimiterConfig {
                max_requests: 1,
                ..Default::default()
            },
        );

        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(!limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(limiter.check("10.0.0.2").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_old_timestamps_fall_out_of_the_window() {
        let stale = RateLimiter::now_epoch_secs() - 10.0;
        let cache = MockCache::new().with_entry(
            "ratelimit:10.0.0.1",
            &vec![stale, stale, stale, stale, stale],
            Some(Duration::from_secs(1)),
        );
        let limiter = limiter_with(cache, RateLimiterConfig::default());

        // all five prior admissions are outside the 1s window
        let decision = limiter.check("10.0.0.1").await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
    }

    #[tokio::test]
    async fn test_rejection_does_not_extend_the_window() {
        let now = RateLimiter::now_epoch_secs();
        let cache = MockCache::new().with_entry(
            "ratelimit:10.0.0.1",
            &vec![now, now, now, now, now],
            Some(Duration::from_secs(1)),
        );
        let cache = Arc::new(cache);
        let limiter = RateLimiter::new(cache.clone(), RateLimiterConfig::default());

        assert!(!limiter.check("10.0.0.1").await.unwrap().allowed);

        // stored window is untouched by the rejected call
        let stored: Option<Vec<f64>> = cache.get("ratelimit:10.0.0.1").await.unwrap();
        assert_eq!(stored.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_fail_closed_surfaces_cache_error() {
        let limiter = limiter_with(
            MockCache::new().with_error("redis down"),
            RateLimiterConfig::default(),
        );

        let result = limiter.check("10.0.0.1").await;
        assert!(matches!(result, Err(DomainError::Cache { .. })));
    }

    #[tokio::test]
    async fn test_fail_open_admits_on_cache_error() {
        let limiter = limiter_with(
            MockCache::new().with_error("redis down"),
            RateLimiterConfig {
                fail_open: true,
                ..Default::default()
            },
        );

        let decision = limiter.check("10.0.0.1").await.unwrap();
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn test_counter_strategy_enforces_limit() {
        let limiter = limiter_with(
            MockCache::new(),
            RateLimiterConfig {
                max_requests: 3,
                window: Duration::from_secs(60),
                strategy: RateLimitStrategy::Counter,
                fail_open: false,
            },
        );

        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        }
        assert!(!limiter.check("10.0.0.1").await.unwrap().allowed);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            "sliding_window".parse::<RateLimitStrategy>().unwrap(),
            RateLimitStrategy::SlidingWindow
        );
        assert_eq!(
            "counter".parse::<RateLimitStrategy>().unwrap(),
            RateLimitStrategy::Counter
        );
        assert!("leaky_bucket".parse::<RateLimitStrategy>().is_err());
    }
}
