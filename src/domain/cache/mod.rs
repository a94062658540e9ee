//! Cache domain - shared expiring key-value abstraction
//!
//! The judgment memo and the rate-limit windows both live behind this trait,
//! so every implementation must tolerate concurrent readers and writers on
//! the same key.

mod repository;

pub use repository::{Cache, CacheExt};

#[cfg(test)]
pub use repository::mock::MockCache;
