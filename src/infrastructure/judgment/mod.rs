//! Judgment storage infrastructure

mod in_memory;
mod persister;
mod postgres_repository;

pub use in_memory::InMemoryJudgmentRepository;
pub use persister::{JudgmentPersister, PersisterConfig};
pub use postgres_repository::PostgresJudgmentRepository;
