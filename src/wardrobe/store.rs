//! Wardrobe persistence — simple data plumbing over the `items` table.
//!
//! The engine itself never touches this module; it receives items as an
//! in-memory collection per request. These functions exist so the HTTP service
//! and CLI have a wardrobe to read from.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;

use crate::embedding::bytes_to_vector;
use crate::wardrobe::{Category, InventoryItem};

/// Fields accepted when creating a wardrobe item.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub color: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub description: Option<String>,
}

/// Insert a new item and return its id.
pub fn insert_item(conn: &Connection, item: &NewItem) -> Result<i64> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO items (type, color, category, description, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            item.kind,
            item.color,
            item.category.as_str(),
            item.description,
            now
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetch a single item by id. Embedding is not loaded.
pub fn get_item(conn: &Connection, id: i64) -> Result<Option<InventoryItem>> {
    let row = conn
        .query_row(
            "SELECT id, type, color, category, description FROM items WHERE id = ?1",
            params![id],
            item_from_row,
        )
        .optional()?;
    Ok(row)
}

/// Delete an item. The embedding cache row cascades. Returns whether a row
/// was removed.
pub fn delete_item(conn: &Connection, id: i64) -> Result<bool> {
    let n = conn.execute("DELETE FROM items WHERE id = ?1", params![id])?;
    Ok(n > 0)
}

/// Load the full wardrobe, joining in any cached embedding produced by
/// `model`. Vectors cached under a different model identifier are left out so
/// the engine recomputes them instead of comparing incompatible vectors.
pub fn load_items(conn: &Connection, model: &str) -> Result<Vec<InventoryItem>> {
    let mut stmt = conn.prepare(
        "SELECT i.id, i.type, i.color, i.category, i.description, e.vector \
         FROM items i \
         LEFT JOIN item_embeddings e ON e.item_id = i.id AND e.model = ?1 \
         ORDER BY i.id",
    )?;
    let rows = stmt
        .query_map(params![model], |row| {
            let mut item = item_from_row(row)?;
            let blob: Option<Vec<u8>> = row.get(5)?;
            item.embedding = blob.as_deref().map(bytes_to_vector);
            Ok(item)
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Fetch specific items by id, preserving input order. Missing ids are skipped.
pub fn fetch_items(conn: &Connection, ids: &[i64]) -> Result<Vec<InventoryItem>> {
    let mut out = Vec::with_capacity(ids.len());
    for &id in ids {
        if let Some(item) = get_item(conn, id)? {
            out.push(item);
        } else {
            tracing::warn!(item_id = id, "item vanished before embedding refresh");
        }
    }
    Ok(out)
}

fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InventoryItem> {
    let category_str: String = row.get(3)?;
    let category: Category = category_str.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })?;
    Ok(InventoryItem {
        id: row.get(0)?,
        kind: row.get(1)?,
        color: row.get(2)?,
        category,
        description: row.get(4)?,
        embedding: None,
    })
}
