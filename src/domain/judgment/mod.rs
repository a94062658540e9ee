//! Judgment domain - sentence pairs, labels and the persisted record

mod entity;
mod pair;
mod repository;

pub use entity::{Judgment, Label};
pub use pair::NormalizedPair;
pub use repository::JudgmentRepository;

#[cfg(test)]
pub use repository::mock::MockJudgmentRepository;
