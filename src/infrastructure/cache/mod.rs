//! Cache infrastructure - in-memory and Redis backends

mod factory;
mod in_memory;
mod redis;

pub use factory::{build_cache, CacheBackend, CacheFactoryConfig};
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use redis::{RedisCache, RedisCacheConfig};
