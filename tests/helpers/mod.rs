#![allow(dead_code)]

use std::sync::Arc;

use garb::config::ScoringConfig;
use garb::embedding::{EmbeddingProvider, EMBEDDING_DIM};
use garb::engine::rules::RuleBook;
use garb::engine::Engine;
use garb::wardrobe::{Category, InventoryItem};
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    garb::db::open_memory_database().unwrap()
}

/// Deterministic embedding provider: hashed bag-of-words over 384 dims.
///
/// Texts sharing tokens get high cosine similarity, disjoint texts get ~0,
/// so intent seeds and wardrobe items behave directionally like a real
/// sentence encoder without any model files.
pub struct BagOfWordsProvider;

impl EmbeddingProvider for BagOfWordsProvider {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            v[(fnv1a(token) % EMBEDDING_DIM as u64) as usize] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }
}

/// FNV-1a, stable across platforms and releases (unlike `DefaultHasher`).
fn fnv1a(s: &str) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Build an engine over the bag-of-words provider with default rules.
pub fn test_engine() -> Engine {
    test_engine_with(ScoringConfig::default())
}

pub fn test_engine_with(tuning: ScoringConfig) -> Engine {
    Engine::new(Arc::new(BagOfWordsProvider), RuleBook::default(), tuning).unwrap()
}

/// An in-memory wardrobe item with its embedding precomputed.
pub fn item(id: i64, kind: &str, color: &str, category: Category) -> InventoryItem {
    let mut it = InventoryItem {
        id,
        kind: kind.into(),
        color: Some(color.into()),
        category,
        description: None,
        embedding: None,
    };
    it.embedding = Some(BagOfWordsProvider.embed(&it.searchable_text()).unwrap());
    it
}

/// A small but complete mixed wardrobe covering every intent reasonably.
pub fn full_wardrobe() -> Vec<InventoryItem> {
    vec![
        item(1, "white t-shirt", "white", Category::Top),
        item(2, "dress shirt", "light blue", Category::Top),
        item(3, "tank top", "gray", Category::Top),
        item(4, "swim shorts", "navy", Category::Bottom),
        item(5, "dark jeans", "denim", Category::Bottom),
        item(6, "suit pants", "charcoal", Category::Bottom),
        item(7, "sandals", "brown", Category::Footwear),
        item(8, "oxford dress shoes", "black", Category::Footwear),
        item(9, "running sneakers", "white", Category::Footwear),
        item(10, "blazer", "navy", Category::Outerwear),
        item(11, "leather belt", "brown", Category::Accessories),
    ]
}
