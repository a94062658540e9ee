//! In-memory judgment repository
//!
//! Backs the `memory` storage backend for local development and tests. The
//! map is guarded by a single RwLock, so duplicate-create detection is
//! atomic within the process, mirroring the database constraint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::judgment::{Judgment, JudgmentRepository, Label};
use crate::domain::DomainError;

#[derive(Debug, Default)]
pub struct InMemoryJudgmentRepository {
    records: RwLock<HashMap<(String, String), Judgment>>,
    next_id: AtomicI64,
}

impl InMemoryJudgmentRepository {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl JudgmentRepository for InMemoryJudgmentRepository {
    async fn create(&self, judgment: Judgment) -> Result<Judgment, DomainError> {
        let key = (
            judgment.sentence1_norm().to_string(),
            judgment.sentence2_norm().to_string(),
        );
        let mut records = self.records.write().await;

        if records.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "Judgment for pair ('{}', '{}') already exists",
                key.0, key.1
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stored = judgment.with_id(id);
        records.insert(key, stored.clone());

        Ok(stored)
    }

    async fn update_for_key(
        &self,
        key1: &str,
        key2: &str,
        similarity: f64,
        label: Label,
    ) -> Result<Option<Judgment>, DomainError> {
        let mut records = self.records.write().await;

        match records.get_mut(&(key1.to_string(), key2.to_string())) {
            Some(judgment) => {
                judgment.apply_update(similarity, label);
                Ok(Some(judgment.clone()))
            }
            None => Ok(None),
        }
    }

    async fn get(&self, key1: &str, key2: &str) -> Result<Option<Judgment>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .get(&(key1.to_string(), key2.to_string()))
            .cloned())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.records.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::judgment::NormalizedPair;

    fn judgment(s1: &str, s2: &str, similarity: f64, label: Label) -> Judgment {
        let pair = NormalizedPair::new(s1, s2).unwrap();
        Judgment::new(&pair, similarity, label)
    }

    #[tokio::test]
    async fn test_create_assigns_id() {
        let repo = InMemoryJudgmentRepository::new();

        let stored = repo
            .create(judgment("Hello", "Hi", 0.9, Label::Entail))
            .await
            .unwrap();

        assert_eq!(stored.id(), 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let repo = InMemoryJudgmentRepository::new();
        repo.create(judgment("Hello", "Hi", 0.9, Label::Entail))
            .await
            .unwrap();

        // case variant normalizes to the same key
        let result = repo.create(judgment("HELLO", "hi ", 0.8, Label::Entail)).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_for_key() {
        let repo = InMemoryJudgmentRepository::new();
        repo.create(judgment("Hello", "Hi", 0.9, Label::Entail))
            .await
            .unwrap();

        let updated = repo
            .update_for_key("hello", "hi", 0.3, Label::NoEntail)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.similarity(), 0.3);
        assert_eq!(updated.label(), Label::NoEntail);
    }

    #[tokio::test]
    async fn test_update_missing_key_returns_none() {
        let repo = InMemoryJudgmentRepository::new();

        let result = repo
            .update_for_key("hello", "hi", 0.3, Label::NoEntail)
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_get_by_normalized_key() {
        let repo = InMemoryJudgmentRepository::new();
        repo.create(judgment("Zebra", "Apple", 0.5, Label::NoEntail))
            .await
            .unwrap();

        let found = repo.get("apple", "zebra").await.unwrap().unwrap();
        assert_eq!(found.sentence1(), "Apple");
        assert_eq!(found.sentence2(), "Zebra");
    }
}
