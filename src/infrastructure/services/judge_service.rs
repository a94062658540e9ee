//! Judgment orchestration
//!
//! Composes the normalizer, the judgment cache, the embedding provider and
//! the contention-safe persister. Persistence is best-effort relative to the
//! response: once a similarity has been computed, storage trouble is logged
//! and the caller still gets the result.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::domain::cache::{Cache, CacheExt};
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::judgment::{Label, NormalizedPair};
use crate::domain::DomainError;
use crate::infrastructure::judgment::JudgmentPersister;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct JudgeServiceConfig {
    /// Similarity at or above this judges ENTAIL
    pub entail_threshold: f64,
    /// TTL for memoized judgments
    pub cache_ttl: Duration,
    /// Whether the bulk path consults and populates the judgment cache.
    /// Off by default: bulk callers tend to submit fresh pairs, so every
    /// bulk pair is recomputed unless this is enabled.
    pub bulk_cache_enabled: bool,
}

impl Default for JudgeServiceConfig {
    fn default() -> Self {
        Self {
            entail_threshold: 0.8,
            cache_ttl: Duration::from_secs(3600),
            bulk_cache_enabled: false,
        }
    }
}

/// Result of judging one sentence pair
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeOutcome {
    pub sentence1: String,
    pub sentence2: String,
    pub similarity: f64,
    pub label: Label,
    pub cached: bool,
}

/// Cache payload for a memoized judgment
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedJudgment {
    sentence1: String,
    sentence2: String,
    similarity: f64,
    label: Label,
}

impl CachedJudgment {
    fn into_outcome(self, cached: bool) -> JudgeOutcome {
        JudgeOutcome {
            sentence1: self.sentence1,
            sentence2: self.sentence2,
            similarity: self.similarity,
            label: self.label,
            cached,
        }
    }
}

impl From<&JudgeOutcome> for CachedJudgment {
    fn from(outcome: &JudgeOutcome) -> Self {
        Self {
            sentence1: outcome.sentence1.clone(),
            sentence2: outcome.sentence2.clone(),
            similarity: outcome.similarity,
            label: outcome.label,
        }
    }
}

/// Entailment judgment orchestrator
#[derive(Debug)]
pub struct JudgeService {
    cache: Arc<dyn Cache>,
    provider: Arc<dyn EmbeddingProvider>,
    persister: Arc<JudgmentPersister>,
    config: JudgeServiceConfig,
}

impl JudgeService {
    pub fn new(
        cache: Arc<dyn Cache>,
        provider: Arc<dyn EmbeddingProvider>,
        persister: Arc<JudgmentPersister>,
        config: JudgeServiceConfig,
    ) -> Self {
        Self {
            cache,
            provider,
            persister,
            config,
        }
    }

    /// Judge a single sentence pair
    pub async fn judge(&self, sentence1: &str, sentence2: &str) -> Result<JudgeOutcome, DomainError> {
        let pair = NormalizedPair::new(sentence1, sentence2)?;
        let key = pair.cache_key();

        if let Some(hit) = self.cache_lookup(&key).await {
            debug!(key = %key, "judgment cache hit");
            return Ok(hit.into_outcome(true));
        }

        let texts = [pair.display1().to_string(), pair.display2().to_string()];
        let embeddings = self.provider.embed(&texts).await?;
        let outcome = self.build_outcome(&pair, embeddings[0].cosine_similarity(&embeddings[1]));

        self.cache_store(&key, &outcome).await;
        self.persist(&pair, &outcome).await;

        Ok(outcome)
    }

    /// Judge a batch of sentence pairs with one embedding call.
    ///
    /// Results come back in input order; each pair's persistence is
    /// independent and best-effort.
    pub async fn judge_bulk(
        &self,
        pairs: &[(String, String)],
    ) -> Result<Vec<JudgeOutcome>, DomainError> {
        let normalized: Vec<NormalizedPair> = pairs
            .iter()
            .map(|(s1, s2)| NormalizedPair::new(s1, s2))
            .collect::<Result<_, _>>()?;

        let mut outcomes: Vec<Option<JudgeOutcome>> = vec![None; normalized.len()];

        if self.config.bulk_cache_enabled {
            for (i, pair) in normalized.iter().enumerate() {
                if let Some(hit) = self.cache_lookup(&pair.cache_key()).await {
                    outcomes[i] = Some(hit.into_outcome(true));
                }
            }
        }

        // flatten the remaining pairs into one adjacent sequence so a single
        // oracle call amortizes its fixed overhead
        let missing: Vec<usize> = (0..normalized.len())
            .filter(|i| outcomes[*i].is_none())
            .collect();

        if !missing.is_empty() {
            let mut texts = Vec::with_capacity(missing.len() * 2);
            for &i in &missing {
                texts.push(normalized[i].display1().to_string());
                texts.push(normalized[i].display2().to_string());
            }

            let embeddings = self.provider.embed(&texts).await?;

            for (slot, &i) in missing.iter().enumerate() {
                let pair = &normalized[i];
                let similarity =
                    embeddings[slot * 2].cosine_similarity(&embeddings[slot * 2 + 1]);
                let outcome = self.build_outcome(pair, similarity);

                if self.config.bulk_cache_enabled {
                    self.cache_store(&pair.cache_key(), &outcome).await;
                }
                self.persist(pair, &outcome).await;

                outcomes[i] = Some(outcome);
            }
        }

        Ok(outcomes.into_iter().flatten().collect())
    }

    fn build_outcome(&self, pair: &NormalizedPair, similarity: f32) -> JudgeOutcome {
        let similarity = round4(similarity as f64);
        let label = Label::from_similarity(similarity, self.config.entail_threshold);

        JudgeOutcome {
            sentence1: pair.display1().to_string(),
            sentence2: pair.display2().to_string(),
            similarity,
            label,
            cached: false,
        }
    }

    /// Cache failures read as a miss; the cache is an optimization, not a
    /// dependency
    async fn cache_lookup(&self, key: &str) -> Option<CachedJudgment> {
        match self.cache.get::<CachedJudgment>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error = %e, "judgment cache unavailable, recomputing");
                None
            }
        }
    }

    async fn cache_store(&self, key: &str, outcome: &JudgeOutcome) {
        let payload = CachedJudgment::from(outcome);
        if let Err(e) = self.cache.set(key, &payload, self.config.cache_ttl).await {
            warn!(key = %key, error = %e, "failed to cache judgment");
        }
    }

    /// Best-effort persistence: the judgment is already computed, so a
    /// storage failure must not fail the request
    async fn persist(&self, pair: &NormalizedPair, outcome: &JudgeOutcome) {
        if let Err(e) = self
            .persister
            .upsert(pair, outcome.similarity, outcome.label)
            .await
        {
            error!(
                key1 = pair.key1(),
                key2 = pair.key2(),
                error = %e,
                "failed to persist judgment"
            );
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
