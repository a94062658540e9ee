//! Application services

mod judge_service;

pub use judge_service::{JudgeOutcome, JudgeService, JudgeServiceConfig};
