//! The recommendation engine.
//!
//! Ties the pipeline together: intent classification ([`intent`]), per-item
//! scoring against keyword rules ([`scorer`], [`rules`]), candidate assembly
//! ([`assembler`]), and final ranking with color harmony ([`ranker`],
//! [`color`]). [`Engine::recommend`] is the single entry point; it is pure
//! over the items it is handed — persistence and embedding refresh live
//! elsewhere.

pub mod assembler;
pub mod color;
pub mod intent;
pub mod ranker;
pub mod rules;
pub mod scorer;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ScoringConfig;
use crate::embedding::{EmbeddingProvider, EMBEDDING_DIM};
use crate::error::{EngineError, Result};
use crate::wardrobe::{Category, InventoryItem};

use intent::{Classification, Intent, IntentClassifier};
use ranker::RankedOutfit;
use rules::RuleBook;

/// Why a recommendation came back empty despite the pipeline succeeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ReasonCode {
    /// A required category has no usable items.
    InsufficientInventory { category: Category },
}

/// The full response for one recommendation request.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub intent: Intent,
    /// Per-label classification scores, for transparency.
    pub intent_scores: Vec<IntentScore>,
    pub outfits: Vec<RankedOutfit>,
    /// Present only when `outfits` is empty for an expected reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntentScore {
    pub intent: Intent,
    pub score: f32,
}

/// The assembled engine: embedding provider, seed bank, rules, tuning.
///
/// Construction is the expensive part (it embeds every intent seed phrase);
/// build once and share.
pub struct Engine {
    provider: Arc<dyn EmbeddingProvider>,
    classifier: IntentClassifier,
    rules: RuleBook,
    tuning: ScoringConfig,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine {
    /// Validate tuning and rules, then embed the intent seed bank.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        rules: RuleBook,
        tuning: ScoringConfig,
    ) -> Result<Self> {
        tuning.validate()?;
        rules.validate()?;
        let classifier = IntentClassifier::new(provider.as_ref(), tuning.fallback_intent())?;
        info!("engine ready, seed bank embedded");
        Ok(Self {
            provider,
            classifier,
            rules,
            tuning,
        })
    }

    pub fn tuning(&self) -> &ScoringConfig {
        &self.tuning
    }

    /// The embedding provider the engine was built with. Shared with the
    /// cache-miss path so queries and items always use the same encoder.
    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Produce up to `k` ranked outfits for `query` from `items`.
    ///
    /// `items` must already carry embeddings where available; items without
    /// one are skipped, not fatal. An empty query falls back to the default
    /// intent and ranks on intent alignment alone. A missing required
    /// category yields an empty result with a reason code — the pipeline
    /// completing with nothing to wear is not an error.
    pub fn recommend(
        &self,
        items: &[InventoryItem],
        query: &str,
        k: Option<usize>,
    ) -> Result<Recommendation> {
        let k = match k {
            None => self.tuning.default_k,
            Some(0) => {
                return Err(EngineError::InvalidRequest("k must be at least 1".into()));
            }
            Some(k) if k > self.tuning.max_k => {
                return Err(EngineError::InvalidRequest(format!(
                    "k must be at most {}, got {k}",
                    self.tuning.max_k
                )));
            }
            Some(k) => k,
        };

        let query = truncate_chars(query.trim(), self.tuning.max_query_len);
        let query_vec = if query.is_empty() {
            None
        } else {
            let vec = self
                .provider
                .embed(query)
                .map_err(|e| EngineError::EncoderUnavailable(e.to_string()))?;
            Some(vec)
        };

        let classification = self.classifier.classify(query_vec.as_deref());
        let Classification { intent, scores } = classification;
        debug!(%intent, query_len = query.len(), "classified request");

        // With no query there is nothing to compare items against, so the
        // query similarity term is identically zero and ranking rides on the
        // intent centroid alone.
        let zero;
        let query_anchor: &[f32] = match query_vec.as_deref() {
            Some(v) => v,
            None => {
                zero = vec![0.0f32; EMBEDDING_DIM];
                &zero
            }
        };
        let intent_vec = self.classifier.intent_vector(intent);

        let pools = scorer::score_items(
            items,
            query_anchor,
            intent_vec,
            intent,
            query,
            &self.rules,
            &self.tuning,
        );

        let intent_scores = scores
            .into_iter()
            .map(|(intent, score)| IntentScore { intent, score })
            .collect();

        let candidates = match assembler::assemble(&pools, self.tuning.max_combinations) {
            Ok(candidates) => candidates,
            Err(EngineError::InsufficientInventory { category }) => {
                info!(%category, "no complete outfit possible");
                return Ok(Recommendation {
                    intent,
                    intent_scores,
                    outfits: Vec::new(),
                    reason: Some(ReasonCode::InsufficientInventory { category }),
                });
            }
            Err(e) => return Err(e),
        };

        let outfits = ranker::rank(candidates, intent, &self.rules, &self.tuning, k);
        Ok(Recommendation {
            intent,
            intent_scores,
            outfits,
            reason: None,
        })
    }
}

/// Truncate to at most `max` characters without splitting a code point.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
