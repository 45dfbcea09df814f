//! Candidate outfit assembly.
//!
//! Walks the per-category pools and produces a bounded set of complete
//! candidate outfits. Every candidate has the three required slots (top,
//! bottom, footwear) filled; outerwear and accessories ride along when the
//! wardrobe has them. Assembly is pure combinatorics over already-scored
//! pools — no I/O, no further model calls.

use std::collections::{BTreeMap, BTreeSet};

use crate::engine::scorer::ScoredItem;
use crate::error::{EngineError, Result};
use crate::wardrobe::{Category, OPTIONAL_CATEGORIES, REQUIRED_CATEGORIES};

/// A complete candidate outfit. Required slots are always present.
#[derive(Debug, Clone)]
pub struct CandidateOutfit {
    pub top: ScoredItem,
    pub bottom: ScoredItem,
    pub footwear: ScoredItem,
    pub outerwear: Option<ScoredItem>,
    pub accessories: Option<ScoredItem>,
}

impl CandidateOutfit {
    /// All member items, required slots first.
    pub fn items(&self) -> Vec<&ScoredItem> {
        let mut out = vec![&self.top, &self.bottom, &self.footwear];
        if let Some(ref o) = self.outerwear {
            out.push(o);
        }
        if let Some(ref a) = self.accessories {
            out.push(a);
        }
        out
    }

    /// Sum of member item ids. Deterministic rank tie-breaker.
    pub fn id_sum(&self) -> i64 {
        self.items().iter().map(|s| s.item.id).sum()
    }
}

/// Build up to `max_combinations` distinct candidates from the pools.
///
/// The walk steps down each required pool in lockstep: iteration `i` takes the
/// pool's `i`-th entry, saturating at the last one when a pool is shorter.
/// This favors pairing strong items with strong items while still varying the
/// combinations. Duplicate item sets collapse to one candidate.
///
/// An empty required pool is not recoverable here; the caller turns the error
/// into an explicit empty recommendation.
pub fn assemble(
    pools: &BTreeMap<Category, Vec<ScoredItem>>,
    max_combinations: usize,
) -> Result<Vec<CandidateOutfit>> {
    for category in REQUIRED_CATEGORIES {
        if pools.get(&category).map_or(true, |p| p.is_empty()) {
            return Err(EngineError::InsufficientInventory { category });
        }
    }

    let tops = &pools[&Category::Top];
    let bottoms = &pools[&Category::Bottom];
    let shoes = &pools[&Category::Footwear];
    let [outerwear, accessories] =
        OPTIONAL_CATEGORIES.map(|category| pools.get(&category).and_then(|p| p.first()));

    let mut seen: BTreeSet<(i64, i64, i64)> = BTreeSet::new();
    let mut candidates = Vec::new();
    for i in 0..max_combinations {
        let top = &tops[i.min(tops.len() - 1)];
        let bottom = &bottoms[i.min(bottoms.len() - 1)];
        let foot = &shoes[i.min(shoes.len() - 1)];
        if !seen.insert((top.item.id, bottom.item.id, foot.item.id)) {
            continue;
        }
        candidates.push(CandidateOutfit {
            top: top.clone(),
            bottom: bottom.clone(),
            footwear: foot.clone(),
            outerwear: outerwear.cloned(),
            accessories: accessories.cloned(),
        });
    }

    Ok(candidates)
}
