//! Judgment entity and label

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::NormalizedPair;
use crate::domain::DomainError;

/// Entailment label derived from the similarity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    Entail,
    NoEntail,
}

impl Label {
    /// Derive the label from a similarity score and threshold
    pub fn from_similarity(similarity: f64, threshold: f64) -> Self {
        if similarity >= threshold {
            Self::Entail
        } else {
            Self::NoEntail
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entail => "ENTAIL",
            Self::NoEntail => "NO_ENTAIL",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "ENTAIL" => Ok(Self::Entail),
            "NO_ENTAIL" => Ok(Self::NoEntail),
            other => Err(DomainError::internal(format!(
                "Unknown judgment label '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted entailment judgment.
///
/// At most one judgment exists per distinct normalized pair; the store
/// enforces this with a uniqueness constraint on
/// `(sentence1_norm, sentence2_norm)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    id: i64,
    sentence1: String,
    sentence2: String,
    sentence1_norm: String,
    sentence2_norm: String,
    similarity: f64,
    label: Label,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Judgment {
    /// Build a new, not-yet-persisted judgment for a normalized pair.
    /// The id is assigned by the store on create.
    pub fn new(pair: &NormalizedPair, similarity: f64, label: Label) -> Self {
        let now = Utc::now();

        Self {
            id: 0,
            sentence1: pair.display1().to_string(),
            sentence2: pair.display2().to_string(),
            sentence1_norm: pair.key1().to_string(),
            sentence2_norm: pair.key2().to_string(),
            similarity,
            label,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate a judgment from stored fields
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: i64,
        sentence1: String,
        sentence2: String,
        sentence1_norm: String,
        sentence2_norm: String,
        similarity: f64,
        label: Label,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sentence1,
            sentence2,
            sentence1_norm,
            sentence2_norm,
            similarity,
            label,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn sentence1(&self) -> &str {
        &self.sentence1
    }

    pub fn sentence2(&self) -> &str {
        &self.sentence2
    }

    pub fn sentence1_norm(&self) -> &str {
        &self.sentence1_norm
    }

    pub fn sentence2_norm(&self) -> &str {
        &self.sentence2_norm
    }

    pub fn similarity(&self) -> f64 {
        self.similarity
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Apply a re-judgment in place, bumping the updated timestamp
    pub fn apply_update(&mut self, similarity: f64, label: Label) {
        self.similarity = similarity;
        self.label = label;
        self.updated_at = Utc::now();
    }
}
