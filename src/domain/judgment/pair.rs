//! Sentence pair normalization
//!
//! The normalized pair is the deduplication key for everything downstream:
//! the judgment cache, the rate-limited compute path, and the uniqueness
//! constraint in the durable store.

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// An unordered sentence pair in canonical form.
///
/// Both sentences are trimmed and lowercased to produce the normalized keys,
/// and the pair is sorted so `key1 <= key2` lexicographically. The display
/// forms are swapped together with the keys, so a stored record is symmetric
/// under input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPair {
    key1: String,
    key2: String,
    display1: String,
    display2: String,
}

impl NormalizedPair {
    /// Normalize a sentence pair. Fails if either sentence is empty after
    /// trimming.
    pub fn new(sentence1: &str, sentence2: &str) -> Result<Self, DomainError> {
        let norm1 = sentence1.trim().to_lowercase();
        let norm2 = sentence2.trim().to_lowercase();

        if norm1.is_empty() || norm2.is_empty() {
            return Err(DomainError::validation(
                "Both 'sentence1' and 'sentence2' are required",
            ));
        }

        if norm1 <= norm2 {
            Ok(Self {
                key1: norm1,
                key2: norm2,
                display1: sentence1.to_string(),
                display2: sentence2.to_string(),
            })
        } else {
            Ok(Self {
                key1: norm2,
                key2: norm1,
                display1: sentence2.to_string(),
                display2: sentence1.to_string(),
            })
        }
    }

    pub fn key1(&self) -> &str {
        &self.key1
    }

    pub fn key2(&self) -> &str {
        &self.key2
    }

    pub fn display1(&self) -> &str {
        &self.display1
    }

    pub fn display2(&self) -> &str {
        &self.display2
    }

    /// Cache key for the memoized judgment of this pair
    pub fn cache_key(&self) -> String {
        format!("judge:{}::{}", self.key1, self.key2)
    }
}
