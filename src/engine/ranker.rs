//! Outfit ranking and rationale.
//!
//! Scores each assembled candidate as a weighted blend of completeness,
//! semantic relevance, and color harmony, plus a small intent bias and an
//! appropriateness credit when the outfit leans into the occasion's preferred
//! garment families. Scores are presented on a 0–100 scale.

use serde::Serialize;

use crate::config::ScoringConfig;
use crate::engine::assembler::CandidateOutfit;
use crate::engine::color;
use crate::engine::intent::Intent;
use crate::engine::rules::RuleBook;
use crate::wardrobe::InventoryItem;

/// A final ranked outfit, ready for the response payload.
#[derive(Debug, Clone, Serialize)]
pub struct RankedOutfit {
    /// Blended score on a 0–100 scale.
    pub score: f64,
    /// Mean item relevance component, in [0, 1].
    pub semantic: f64,
    /// Color harmony component, in [0, 1].
    pub harmony: f64,
    pub items: Vec<InventoryItem>,
    /// One-sentence explanation of why this outfit ranked where it did.
    pub rationale: String,
}

/// Rank candidates and keep the top `k`.
///
/// Ordering is score descending; exact ties resolve to the candidate with the
/// smaller item-id sum so repeated requests agree.
pub fn rank(
    candidates: Vec<CandidateOutfit>,
    intent: Intent,
    rules: &RuleBook,
    tuning: &ScoringConfig,
    k: usize,
) -> Vec<RankedOutfit> {
    let mut scored: Vec<(f64, i64, RankedOutfit)> = candidates
        .into_iter()
        .map(|candidate| {
            let id_sum = candidate.id_sum();
            let ranked = score_candidate(candidate, intent, rules, tuning);
            (ranked.score, id_sum, ranked)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    });

    scored
        .into_iter()
        .take(k)
        .map(|(_, _, ranked)| ranked)
        .collect()
}

fn score_candidate(
    candidate: CandidateOutfit,
    intent: Intent,
    rules: &RuleBook,
    tuning: &ScoringConfig,
) -> RankedOutfit {
    let members = candidate.items();

    // Negative item scores would otherwise drag a complete outfit below an
    // incomplete-looking one; relevance floors at zero per item.
    let semantic = members
        .iter()
        .map(|s| s.score.max(0.0))
        .sum::<f64>()
        / members.len() as f64;

    let colors: Vec<&str> = members
        .iter()
        .filter_map(|s| s.item.color.as_deref())
        .filter(|c| !c.is_empty())
        .collect();
    let harmony = color::harmony(&colors);

    // Assembly guarantees the required slots, so completeness contributes its
    // full weight; it exists as a separate term so the weights stay legible.
    let completeness = 1.0;

    let matched = matched_prefer_keywords(&candidate, intent, rules);
    let mut bonus = rules.bias(intent);
    if matched.len() >= 2 {
        bonus += tuning.keyword_credit;
    }

    let blended = tuning.completeness_weight * completeness
        + tuning.semantic_weight * semantic
        + tuning.harmony_weight * harmony
        + bonus;
    let score = (blended.clamp(0.0, 1.0) * 1000.0).round() / 10.0;

    let rationale = build_rationale(
        intent,
        semantic,
        harmony,
        &matched,
        candidate.outerwear.is_some(),
    );
    let items = candidate
        .items()
        .into_iter()
        .map(|s| {
            let mut item = s.item.clone();
            item.embedding = None;
            item
        })
        .collect();

    RankedOutfit {
        score,
        semantic,
        harmony,
        items,
        rationale,
    }
}

/// Items (by type label) matching the intent's preferred garment families.
fn matched_prefer_keywords<'a>(
    candidate: &'a CandidateOutfit,
    intent: Intent,
    rules: &RuleBook,
) -> Vec<&'a str> {
    candidate
        .items()
        .into_iter()
        .filter(|s| rules.matches_prefer_family(intent, &s.item.keyword_text()))
        .map(|s| s.item.kind.as_str())
        .collect()
}

fn build_rationale(
    intent: Intent,
    semantic: f64,
    harmony: f64,
    matched: &[&str],
    layered: bool,
) -> String {
    let relevance = if semantic >= 0.45 {
        "items closely match the request"
    } else if semantic >= 0.2 {
        "items broadly fit the request"
    } else {
        "the closest available pieces"
    };
    let palette = if harmony >= 0.85 {
        "a coordinated palette"
    } else if harmony >= 0.6 {
        "workable colors"
    } else {
        "a bold color contrast"
    };

    let mut sentence = format!("A {intent} look: {relevance}, with {palette}");
    if !matched.is_empty() {
        let names = matched.join(", ");
        sentence.push_str(&format!("; {names} suit the occasion"));
    }
    if !layered {
        sentence.push_str("; no outer layer was available");
    }
    sentence.push('.');
    sentence
}
