//! Wardrobe statistics — per-category counts and embedding cache coverage.

use anyhow::Result;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary of the wardrobe and its embedding cache.
#[derive(Debug, Serialize)]
pub struct WardrobeStats {
    pub total_items: usize,
    /// Item counts keyed by category name.
    pub by_category: BTreeMap<String, usize>,
    /// Items with a cached vector for the current model.
    pub embedded_items: usize,
    /// Cached vectors left over from other model versions.
    pub stale_embeddings: usize,
}

/// Collect wardrobe stats for the given embedding model identifier.
pub fn collect_stats(conn: &Connection, model: &str) -> Result<WardrobeStats> {
    let mut by_category = BTreeMap::new();
    let mut total = 0usize;

    let mut stmt = conn.prepare("SELECT category, COUNT(*) FROM items GROUP BY category")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (category, count) = row?;
        total += count as usize;
        by_category.insert(category, count as usize);
    }

    let embedded: i64 = conn.query_row(
        "SELECT COUNT(*) FROM item_embeddings WHERE model = ?1",
        params![model],
        |row| row.get(0),
    )?;
    let stale: i64 = conn.query_row(
        "SELECT COUNT(*) FROM item_embeddings WHERE model != ?1",
        params![model],
        |row| row.get(0),
    )?;

    Ok(WardrobeStats {
        total_items: total,
        by_category,
        embedded_items: embedded as usize,
        stale_embeddings: stale as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::embedding::cache::upsert_embedding;
    use crate::wardrobe::store::{insert_item, NewItem};
    use crate::wardrobe::Category;

    #[test]
    fn counts_categories_and_cache_coverage() {
        let conn = db::open_memory_database().unwrap();
        let mk = |kind: &str, category| NewItem {
            kind: kind.into(),
            color: None,
            category,
            description: None,
        };
        let a = insert_item(&conn, &mk("tee", Category::Top)).unwrap();
        let b = insert_item(&conn, &mk("polo", Category::Top)).unwrap();
        insert_item(&conn, &mk("jeans", Category::Bottom)).unwrap();

        upsert_embedding(&conn, a, "m1", &[1.0]).unwrap();
        upsert_embedding(&conn, b, "m0", &[1.0]).unwrap();

        let stats = collect_stats(&conn, "m1").unwrap();
        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.by_category["top"], 2);
        assert_eq!(stats.by_category["bottom"], 1);
        assert_eq!(stats.embedded_items, 1);
        assert_eq!(stats.stale_embeddings, 1);
    }
}
