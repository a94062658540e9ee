//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, CacheConfig, DatabaseConfig, EmbeddingConfig, JudgeConfig, LogFormat,
    LoggingConfig, PersistenceConfig, RateLimitConfig, ServerConfig,
};
