//! Contention-safe judgment persistence
//!
//! Create-then-fallback-to-update with bounded retry. Existence is only ever
//! decided by attempting the insert and catching the uniqueness violation;
//! a read-then-write would reopen the race the constraint closes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::domain::judgment::{Judgment, JudgmentRepository, Label, NormalizedPair};
use crate::domain::DomainError;

/// Persister retry configuration
#[derive(Debug, Clone)]
pub struct PersisterConfig {
    /// Maximum create/update attempts before giving up
    pub max_attempts: u32,
    /// Linear backoff base; sleep is `attempt * base_backoff`
    pub base_backoff: Duration,
    /// Optional cap on total elapsed retry time
    pub max_elapsed: Option<Duration>,
}

impl Default for PersisterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff: Duration::from_millis(20),
            max_elapsed: None,
        }
    }
}

/// Writes judgments through the repository, converging racing writers for
/// the same normalized pair onto a single record.
#[derive(Debug)]
pub struct JudgmentPersister {
    repository: Arc<dyn JudgmentRepository>,
    config: PersisterConfig,
}

impl JudgmentPersister {
    pub fn new(repository: Arc<dyn JudgmentRepository>, config: PersisterConfig) -> Self {
        Self { repository, config }
    }

    /// Create or update the judgment for a normalized pair.
    ///
    /// State machine per attempt: optimistic create; on uniqueness conflict,
    /// locked update of the existing row; if the row vanished before the
    /// update saw it (creator not yet visible, or rolled back), retry from
    /// the top with linear backoff. Exhaustion is a storage error - data is
    /// never corrupted, the caller just lacks confirmation.
    pub async fn upsert(
        &self,
        pair: &NormalizedPair,
        similarity: f64,
        label: Label,
    ) -> Result<Judgment, DomainError> {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            match self
                .repository
                .create(Judgment::new(pair, similarity, label))
                .await
            {
                Ok(judgment) => {
                    debug!(
                        key1 = pair.key1(),
                        key2 = pair.key2(),
                        id = judgment.id(),
                        attempt,
                        "judgment created"
                    );
                    return Ok(judgment);
                }
                Err(DomainError::Conflict { .. }) => {
                    match self
                        .repository
                        .update_for_key(pair.key1(), pair.key2(), similarity, label)
                        .await?
                    {
                        Some(judgment) => {
                            debug!(
                                key1 = pair.key1(),
                                key2 = pair.key2(),
                                id = judgment.id(),
                                attempt,
                                "judgment updated after create conflict"
                            );
                            return Ok(judgment);
                        }
                        None => {
                            warn!(
                                key1 = pair.key1(),
                                key2 = pair.key2(),
                                attempt,
                                "existing judgment vanished before update, retrying"
                            );
                        }
                    }
                }
                Err(e) => return Err(e),
            }

            if attempt >= self.config.max_attempts {
                error!(
                    key1 = pair.key1(),
                    key2 = pair.key2(),
                    attempts = attempt,
                    "judgment upsert exhausted retry budget under contention"
                );
                return Err(DomainError::storage(format!(
                    "Could not persist judgment for ('{}', '{}') after {} attempts due to contention",
                    pair.key1(),
                    pair.key2(),
                    attempt
                )));
            }

            if let Some(max_elapsed) = self.config.max_elapsed {
                if started.elapsed() >= max_elapsed {
                    error!(
                        key1 = pair.key1(),
                        key2 = pair.key2(),
                        attempts = attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "judgment upsert exceeded elapsed-time budget"
                    );
                    return Err(DomainError::storage(format!(
                        "Could not persist judgment for ('{}', '{}') within the retry time budget",
                        pair.key1(),
                        pair.key2()
                    )));
                }
            }

            tokio::time::sleep(self.config.base_backoff * attempt).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::judgment::MockJudgmentRepository;
    use crate::infrastructure::judgment::InMemoryJudgmentRepository;

    fn fast_config() -> PersisterConfig {
        PersisterConfig {
            max_attempts: 5,
            base_backoff: Duration::from_millis(1),
            max_elapsed: None,
        }
    }

    fn pair(s1: &str, s2: &str) -> NormalizedPair {
        NormalizedPair::new(s1, s2).unwrap()
    }

    #[tokio::test]
    async fn test_plain_create() {
        let repo = Arc::new(MockJudgmentRepository::new());
        let persister = JudgmentPersister::new(repo.clone(), fast_config());

        let judgment = persister
            .upsert(&pair("Hello", "Hi"), 0.9, Label::Entail)
            .await
            .unwrap();

        assert_eq!(judgment.sentence1_norm(), "hello");
        assert_eq!(repo.create_calls(), 1);
        assert_eq!(repo.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_conflict_falls_back_to_update() {
        let repo = Arc::new(MockJudgmentRepository::new());
        let persister = JudgmentPersister::new(repo.clone(), fast_config());

        persister
            .upsert(&pair("Hello", "Hi"), 0.9, Label::Entail)
            .await
            .unwrap();

        // second writer for a case variant of the same pair
        let judgment = persister
            .upsert(&pair("HELLO", " hi"), 0.4, Label::NoEntail)
            .await
            .unwrap();

        assert_eq!(judgment.similarity(), 0.4);
        assert_eq!(judgment.label(), Label::NoEntail);
        assert_eq!(repo.update_calls(), 1);

        let count = repo.count().await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_vanished_row_retries_until_create_succeeds() {
        // first create conflicts, the matching update sees no row, second
        // attempt's create lands
        let repo = Arc::new(
            MockJudgmentRepository::new()
                .with_conflicting_creates(1)
                .with_vanishing_updates(1),
        );
        let persister = JudgmentPersister::new(repo.clone(), fast_config());

        let judgment = persister
            .upsert(&pair("Hello", "Hi"), 0.9, Label::Entail)
            .await
            .unwrap();

        assert_eq!(judgment.similarity(), 0.9);
        assert_eq!(repo.create_calls(), 2);
        assert_eq!(repo.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail_with_storage_error() {
        let repo = Arc::new(
            MockJudgmentRepository::new()
                .with_conflicting_creates(10)
                .with_vanishing_updates(10),
        );
        let persister = JudgmentPersister::new(repo.clone(), fast_config());

        let result = persister
            .upsert(&pair("Hello", "Hi"), 0.9, Label::Entail)
            .await;

        assert!(matches!(result, Err(DomainError::Storage { .. })));
        assert_eq!(repo.create_calls(), 5);
    }

    #[tokio::test]
    async fn test_storage_error_is_not_retried() {
        let repo = Arc::new(MockJudgmentRepository::new().with_storage_error("pg down"));
        let persister = JudgmentPersister::new(repo.clone(), fast_config());

        let result = persister
            .upsert(&pair("Hello", "Hi"), 0.9, Label::Entail)
            .await;

        assert!(matches!(result, Err(DomainError::Storage { .. })));
        assert_eq!(repo.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_elapsed_budget_caps_retries() {
        let repo = Arc::new(
            MockJudgmentRepository::new()
                .with_conflicting_creates(100)
                .with_vanishing_updates(100),
        );
        let persister = JudgmentPersister::new(
            repo.clone(),
            PersisterConfig {
                max_attempts: 100,
                base_backoff: Duration::from_millis(5),
                max_elapsed: Some(Duration::from_millis(1)),
            },
        );

        let result = persister
            .upsert(&pair("Hello", "Hi"), 0.9, Label::Entail)
            .await;

        assert!(matches!(result, Err(DomainError::Storage { .. })));
        assert!(repo.create_calls() < 100);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_converge_to_one_record() {
        let repo = Arc::new(InMemoryJudgmentRepository::new());
        let persister = Arc::new(JudgmentPersister::new(repo.clone(), fast_config()));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let persister = persister.clone();
            handles.push(tokio::spawn(async move {
                persister
                    .upsert(&pair("Hello", "Hi"), 0.9, Label::Entail)
                    .await
            }));
        }

        for handle in handles {
            // no writer may lose: every upsert must confirm persistence
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repo.count().await.unwrap(), 1);
        let stored = repo.get("hello", "hi").await.unwrap().unwrap();
        assert_eq!(stored.sentence1_norm(), "hello");
        assert_eq!(stored.sentence2_norm(), "hi");
    }
}
