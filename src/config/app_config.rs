use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cache: CacheConfig,
    pub database: DatabaseConfig,
    pub embedding: EmbeddingConfig,
    pub rate_limit: RateLimitConfig,
    pub judge: JudgeConfig,
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Judgment cache backend selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// "memory" or "redis"
    pub backend: String,
    pub redis_url: Option<String>,
    pub key_prefix: Option<String>,
    pub default_ttl_secs: u64,
    pub max_capacity: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// "memory" or "postgres"
    pub backend: String,
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
    /// "sliding_window" or "counter"
    pub strategy: String,
    pub fail_open: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub entail_threshold: f64,
    pub cache_ttl_secs: u64,
    pub max_bulk_pairs: usize,
    pub bulk_cache_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_elapsed_ms: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            redis_url: None,
            key_prefix: None,
            default_ttl_secs: 3600,
            max_capacity: 10_000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            url: None,
            max_connections: 10,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: None,
            timeout_secs: 30,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_secs: 1,
            strategy: "sliding_window".to_string(),
            fail_open: false,
        }
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            entail_threshold: 0.8,
            cache_ttl_secs: 3600,
            max_bulk_pairs: 100,
            bulk_cache_enabled: false,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_ms: 20,
            max_elapsed_ms: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.backend, "memory");
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_secs, 1);
        assert_eq!(config.judge.entail_threshold, 0.8);
        assert_eq!(config.judge.max_bulk_pairs, 100);
        assert!(!config.judge.bulk_cache_enabled);
        assert_eq!(config.persistence.max_attempts, 5);
        assert_eq!(config.persistence.base_backoff_ms, 20);
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "server": { "port": 9090 }, "judge": { "entail_threshold": 0.9 } }"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.judge.entail_threshold, 0.9);
        assert_eq!(config.judge.cache_ttl_secs, 3600);
    }

    #[test]
    fn test_log_format_deserialization() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{ "level": "debug", "format": "json" }"#).unwrap();
        assert!(matches!(config.format, LogFormat::Json));
    }
}
