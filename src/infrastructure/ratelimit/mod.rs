//! Rate limiting infrastructure

mod sliding_window;

pub use sliding_window::{RateLimitDecision, RateLimiter, RateLimiterConfig, RateLimitStrategy};
