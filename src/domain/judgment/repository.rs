//! Judgment repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Judgment, Label};
use crate::domain::DomainError;

/// Repository trait for judgment storage.
///
/// Existence of a judgment must only ever be decided by attempting the write:
/// `create` reports a duplicate via `DomainError::Conflict` raised by the
/// store's uniqueness constraint, never by a prior read.
#[async_trait]
pub trait JudgmentRepository: Send + Sync + Debug {
    /// Insert a new judgment. Returns the stored record with its assigned id,
    /// or `DomainError::Conflict` if a record for the same normalized pair
    /// already exists.
    async fn create(&self, judgment: Judgment) -> Result<Judgment, DomainError>;

    /// Lock the existing record for the normalized key and update its
    /// similarity, label and updated timestamp in the same transaction.
    ///
    /// Returns `None` when no record exists for the key - a narrow race where
    /// the concurrent creator is not yet visible or rolled back. Callers
    /// treat that as transient and retry.
    async fn update_for_key(
        &self,
        key1: &str,
        key2: &str,
        similarity: f64,
        label: Label,
    ) -> Result<Option<Judgment>, DomainError>;

    /// Fetch the judgment for a normalized key, if any
    async fn get(&self, key1: &str, key2: &str) -> Result<Option<Judgment>, DomainError>;

    /// Total number of stored judgments
    async fn count(&self) -> Result<u64, DomainError>;
}
