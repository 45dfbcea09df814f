//! Occasion intent classification.
//!
//! Maps a free-text query to one label from a closed set of occasions by
//! nearest-seed-vector comparison: every label carries a handful of canonical
//! seed phrases; the query wins the label whose best-matching seed is closest.
//! The classifier always answers — an empty query falls back to a configured
//! default label, and ties resolve to the first label in declaration order.

use serde::{Deserialize, Serialize};

use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::error::{EngineError, Result};

/// The closed set of occasion labels.
///
/// Declaration order doubles as the deterministic tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Business,
    Formal,
    Party,
    Casual,
    Workout,
    Beach,
    Hiking,
}

/// All labels, in tie-break order.
pub const ALL_INTENTS: [Intent; 7] = [
    Intent::Business,
    Intent::Formal,
    Intent::Party,
    Intent::Casual,
    Intent::Workout,
    Intent::Beach,
    Intent::Hiking,
];

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::Formal => "formal",
            Self::Party => "party",
            Self::Casual => "casual",
            Self::Workout => "workout",
            Self::Beach => "beach",
            Self::Hiking => "hiking",
        }
    }

    /// Canonical seed phrases describing outfits for this occasion.
    pub fn seed_phrases(&self) -> &'static [&'static str] {
        match self {
            Self::Business => &[
                "office meeting outfit, smart shirt and trousers",
                "professional attire, blazer and chinos, leather shoes",
            ],
            Self::Formal => &[
                "black tie event, tuxedo, dress shirt, polished shoes",
                "wedding attire, suit and tie, dress shoes",
            ],
            Self::Party => &[
                "night out outfit, stylish blazer or shirt, dark jeans",
                "date night look, elegant top and tailored pants",
            ],
            Self::Casual => &[
                "everyday wear, t-shirt and jeans or chinos",
                "relaxed outfit for brunch or errands",
            ],
            Self::Workout => &[
                "gym clothing, shorts, breathable top, athletic shoes",
                "running or training gear, performance fabrics",
            ],
            Self::Beach => &[
                "hot weather, shorts, light shirt, sandals or slides",
                "seaside day, airy outfit, sun protection",
                "going to swim, pool day, swim shorts and sandals",
            ],
            Self::Hiking => &[
                "outdoor trail, sturdy boots, breathable layers",
                "active wear for walking long distances",
            ],
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "business" => Ok(Self::Business),
            "formal" => Ok(Self::Formal),
            "party" => Ok(Self::Party),
            "casual" => Ok(Self::Casual),
            "workout" => Ok(Self::Workout),
            "beach" => Ok(Self::Beach),
            "hiking" => Ok(Self::Hiking),
            _ => Err(format!("unknown intent label: {s}")),
        }
    }
}

/// Classification outcome: the winning label plus per-label scores, kept for
/// transparency in responses and rationale.
#[derive(Debug, Clone)]
pub struct Classification {
    pub intent: Intent,
    /// (label, best seed similarity) for every label, in declaration order.
    pub scores: Vec<(Intent, f32)>,
}

/// Seed-vector bank built once at engine startup and reused per request.
pub struct IntentClassifier {
    /// Seed embeddings grouped per label, in [`ALL_INTENTS`] order.
    seeds: Vec<Vec<Vec<f32>>>,
    /// Normalized mean of each label's seed vectors — the "intent vector"
    /// used by the item scorer.
    centroids: Vec<Vec<f32>>,
    fallback: Intent,
}

impl IntentClassifier {
    /// Embed every seed phrase in one batch call and build the bank.
    pub fn new(provider: &dyn EmbeddingProvider, fallback: Intent) -> Result<Self> {
        let phrases: Vec<&str> = ALL_INTENTS
            .iter()
            .flat_map(|label| label.seed_phrases().iter().copied())
            .collect();
        let vectors = provider
            .embed_batch(&phrases)
            .map_err(|e| EngineError::EncoderUnavailable(e.to_string()))?;

        let mut seeds = Vec::with_capacity(ALL_INTENTS.len());
        let mut centroids = Vec::with_capacity(ALL_INTENTS.len());
        let mut offset = 0;
        for label in ALL_INTENTS {
            let n = label.seed_phrases().len();
            let group: Vec<Vec<f32>> = vectors[offset..offset + n].to_vec();
            offset += n;
            centroids.push(centroid(&group));
            seeds.push(group);
        }

        Ok(Self {
            seeds,
            centroids,
            fallback,
        })
    }

    /// Classify an already-embedded query. `query_vec` is `None` for an empty
    /// query, which short-circuits to the fallback label.
    pub fn classify(&self, query_vec: Option<&[f32]>) -> Classification {
        let Some(query_vec) = query_vec else {
            return Classification {
                intent: self.fallback,
                scores: ALL_INTENTS.iter().map(|&l| (l, 0.0)).collect(),
            };
        };

        let mut scores = Vec::with_capacity(ALL_INTENTS.len());
        let mut best = self.fallback;
        let mut best_score = f32::NEG_INFINITY;
        for (i, &label) in ALL_INTENTS.iter().enumerate() {
            let score = self.seeds[i]
                .iter()
                .map(|seed| cosine_similarity(query_vec, seed))
                .fold(f32::NEG_INFINITY, f32::max);
            scores.push((label, score));
            // Strict > keeps the first label on ties (declaration order)
            if score > best_score {
                best_score = score;
                best = label;
            }
        }

        Classification {
            intent: best,
            scores,
        }
    }

    /// The intent vector used as the scorer's second similarity anchor.
    pub fn intent_vector(&self, intent: Intent) -> &[f32] {
        let idx = ALL_INTENTS
            .iter()
            .position(|&l| l == intent)
            .expect("intent is in the closed set");
        &self.centroids[idx]
    }

    pub fn fallback(&self) -> Intent {
        self.fallback
    }
}

/// L2-normalized mean of a group of vectors.
fn centroid(group: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = group.first() else {
        return Vec::new();
    };
    let mut mean = vec![0.0f32; first.len()];
    for v in group {
        for (m, x) in mean.iter_mut().zip(v) {
            *m += x;
        }
    }
    let n = group.len() as f32;
    for m in &mut mean {
        *m /= n;
    }
    let norm: f32 = mean.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for m in &mut mean {
            *m /= norm;
        }
    }
    mean
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Provider that spikes one dimension per known phrase prefix, so seed
    /// groups are mutually orthogonal.
    struct SpikeProvider;

    impl EmbeddingProvider for SpikeProvider {
        fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            let mut v = vec![0.0f32; 16];
            let dim = match text {
                t if t.contains("office") || t.contains("professional") => 0,
                t if t.contains("tuxedo") || t.contains("wedding") => 1,
                t if t.contains("night out") || t.contains("date night") => 2,
                t if t.contains("everyday") || t.contains("relaxed") => 3,
                t if t.contains("gym") || t.contains("training") => 4,
                t if t.contains("swim") || t.contains("seaside") || t.contains("hot weather") => 5,
                t if t.contains("trail") || t.contains("walking") => 6,
                _ => 7,
            };
            v[dim] = 1.0;
            Ok(v)
        }
    }

    fn classifier() -> IntentClassifier {
        IntentClassifier::new(&SpikeProvider, Intent::Casual).unwrap()
    }

    #[test]
    fn classify_picks_label_with_best_seed() {
        let c = classifier();
        let query = SpikeProvider.embed("going to swim").unwrap();
        let result = c.classify(Some(&query));
        assert_eq!(result.intent, Intent::Beach);
        assert_eq!(result.scores.len(), ALL_INTENTS.len());
    }

    #[test]
    fn classify_is_deterministic() {
        let c = classifier();
        let query = SpikeProvider.embed("office presentation").unwrap();
        let a = c.classify(Some(&query)).intent;
        let b = c.classify(Some(&query)).intent;
        assert_eq!(a, b);
        assert_eq!(a, Intent::Business);
    }

    #[test]
    fn empty_query_falls_back() {
        let c = classifier();
        assert_eq!(c.classify(None).intent, Intent::Casual);
    }

    #[test]
    fn tie_breaks_to_declaration_order() {
        let c = classifier();
        // Orthogonal to every seed — all scores equal (0), first label wins.
        let mut v = vec![0.0f32; 16];
        v[15] = 1.0;
        assert_eq!(c.classify(Some(&v)).intent, Intent::Business);
    }

    #[test]
    fn intent_vector_is_normalized() {
        let c = classifier();
        let v = c.intent_vector(Intent::Workout);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn intent_parses_from_str() {
        assert_eq!("Beach".parse::<Intent>().unwrap(), Intent::Beach);
        assert!("brunch".parse::<Intent>().is_err());
    }
}
