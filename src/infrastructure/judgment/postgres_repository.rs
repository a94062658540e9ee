//! PostgreSQL judgment repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};

use crate::domain::judgment::{Judgment, JudgmentRepository, Label};
use crate::domain::DomainError;

/// PostgreSQL implementation of JudgmentRepository.
///
/// The `judgments_norm_pair_key` uniqueness constraint on
/// `(sentence1_norm, sentence2_norm)` is the single source of truth for
/// whether a pair already has a record; `create` surfaces its violation as a
/// conflict instead of pre-checking with a read.
#[derive(Debug, Clone)]
pub struct PostgresJudgmentRepository {
    pool: PgPool,
}

impl PostgresJudgmentRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JudgmentRepository for PostgresJudgmentRepository {
    async fn create(&self, judgment: Judgment) -> Result<Judgment, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO judgments (sentence1, sentence2, sentence1_norm, sentence2_norm,
                                   similarity, label, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(judgment.sentence1())
        .bind(judgment.sentence2())
        .bind(judgment.sentence1_norm())
        .bind(judgment.sentence2_norm())
        .bind(judgment.similarity())
        .bind(judgment.label().as_str())
        .bind(judgment.created_at())
        .bind(judgment.updated_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return DomainError::conflict(format!(
                        "Judgment for pair ('{}', '{}') already exists",
                        judgment.sentence1_norm(),
                        judgment.sentence2_norm()
                    ));
                }
            }
            DomainError::storage(format!("Failed to create judgment: {}", e))
        })?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| DomainError::storage(format!("Failed to read judgment id: {}", e)))?;

        Ok(judgment.with_id(id))
    }

    async fn update_for_key(
        &self,
        key1: &str,
        key2: &str,
        similarity: f64,
        label: Label,
    ) -> Result<Option<Judgment>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        // row lock held until commit, serializing racing updaters
        let row = sqlx::query(
            r#"
            SELECT id FROM judgments
            WHERE sentence1_norm = $1 AND sentence2_norm = $2
            FOR UPDATE
            "#,
        )
        .bind(key1)
        .bind(key2)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to lock judgment: {}", e)))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| DomainError::storage(format!("Failed to roll back: {}", e)))?;
            return Ok(None);
        };

        let id: i64 = row
            .try_get("id")
            .map_err(|e| DomainError::storage(format!("Failed to read judgment id: {}", e)))?;

        let updated = sqlx::query(
            r#"
            UPDATE judgments
            SET similarity = $2, label = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, sentence1, sentence2, sentence1_norm, sentence2_norm,
                      similarity, label, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(similarity)
        .bind(label.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update judgment: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit update: {}", e)))?;

        Ok(Some(row_to_judgment(&updated)?))
    }

    async fn get(&self, key1: &str, key2: &str) -> Result<Option<Judgment>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, sentence1, sentence2, sentence1_norm, sentence2_norm,
                   similarity, label, created_at, updated_at
            FROM judgments
            WHERE sentence1_norm = $1 AND sentence2_norm = $2
            "#,
        )
        .bind(key1)
        .bind(key2)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get judgment: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_judgment(&row)?)),
            None => Ok(None),
        }
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM judgments")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count judgments: {}", e)))?;

        let count: i64 = row
            .try_get("count")
            .map_err(|e| DomainError::storage(format!("Failed to read count: {}", e)))?;

        Ok(count as u64)
    }
}

fn row_to_judgment(row: &sqlx::postgres::PgRow) -> Result<Judgment, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Failed to read judgment row: {}", e));

    let label_str: String = row.try_get("label").map_err(read)?;

    Ok(Judgment::from_parts(
        row.try_get("id").map_err(read)?,
        row.try_get("sentence1").map_err(read)?,
        row.try_get("sentence2").map_err(read)?,
        row.try_get("sentence1_norm").map_err(read)?,
        row.try_get("sentence2_norm").map_err(read)?,
        row.try_get("similarity").map_err(read)?,
        Label::parse(&label_str)?,
        row.try_get("created_at").map_err(read)?,
        row.try_get("updated_at").map_err(read)?,
    ))
}
