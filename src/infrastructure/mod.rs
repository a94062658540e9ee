//! Infrastructure layer - External service implementations

pub mod cache;
pub mod embedding;
pub mod judgment;
pub mod logging;
pub mod ratelimit;
pub mod services;
