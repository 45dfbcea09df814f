//! Per-item embedding cache over the `item_embeddings` table.
//!
//! Vectors are keyed by item id and stamped with the model identifier that
//! produced them. All writers use upsert-by-item-id semantics: embeddings are
//! a pure function of item text, so last-writer-wins is safe and concurrent
//! writers can never corrupt another item's row.

use rusqlite::{params, Connection, OptionalExtension};

use super::{bytes_to_vector, vector_to_bytes, EmbeddingProvider};
use crate::error::{EngineError, Result};
use crate::wardrobe::InventoryItem;

/// Insert or replace the cached vector for one item.
pub fn upsert_embedding(
    conn: &Connection,
    item_id: i64,
    model: &str,
    vector: &[f32],
) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO item_embeddings (item_id, model, dim, vector, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(item_id) DO UPDATE SET \
             model = excluded.model, dim = excluded.dim, \
             vector = excluded.vector, updated_at = excluded.updated_at",
        params![item_id, model, vector.len() as i64, vector_to_bytes(vector), now],
    )?;
    Ok(())
}

/// Commit a whole batch of vectors in a single transaction.
pub fn upsert_batch(
    conn: &mut Connection,
    model: &str,
    entries: &[(i64, Vec<f32>)],
) -> Result<()> {
    let tx = conn.transaction()?;
    for (item_id, vector) in entries {
        let now = chrono::Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO item_embeddings (item_id, model, dim, vector, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(item_id) DO UPDATE SET \
                 model = excluded.model, dim = excluded.dim, \
                 vector = excluded.vector, updated_at = excluded.updated_at",
            params![item_id, model, vector.len() as i64, vector_to_bytes(vector), now],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// Read the cached vector for an item, treating rows from another model as a miss.
pub fn get_embedding(conn: &Connection, item_id: i64, model: &str) -> Result<Option<Vec<f32>>> {
    let blob: Option<Vec<u8>> = conn
        .query_row(
            "SELECT vector FROM item_embeddings WHERE item_id = ?1 AND model = ?2",
            params![item_id, model],
            |row| row.get(0),
        )
        .optional()?;
    Ok(blob.as_deref().map(bytes_to_vector))
}

/// Delete every cached vector not produced by `model`. Returns rows removed.
pub fn invalidate_other_models(conn: &Connection, model: &str) -> Result<usize> {
    let n = conn.execute(
        "DELETE FROM item_embeddings WHERE model != ?1",
        params![model],
    )?;
    if n > 0 {
        tracing::info!(removed = n, model, "invalidated stale embedding cache rows");
    }
    Ok(n)
}

/// Fill in missing item vectors synchronously (the cache-miss path).
///
/// Items already carrying a vector are untouched. Missing ones are embedded in
/// one batch call and upserted inside a single transaction, so a request is
/// never blocked waiting on the background worker. Items with no usable text
/// stay vector-less and are later excluded by the scorer.
pub fn ensure_embeddings(
    conn: &mut Connection,
    provider: &dyn EmbeddingProvider,
    model: &str,
    items: &mut [InventoryItem],
) -> Result<()> {
    let mut texts: Vec<String> = Vec::new();
    let mut missing: Vec<usize> = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        if item.embedding.is_some() {
            continue;
        }
        let text = item.searchable_text();
        if text.is_empty() {
            tracing::warn!(item_id = item.id, "item has no searchable text, skipping embedding");
            continue;
        }
        missing.push(idx);
        texts.push(text);
    }
    if missing.is_empty() {
        return Ok(());
    }

    let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
    let vectors = provider
        .embed_batch(&refs)
        .map_err(|e| EngineError::EncoderUnavailable(e.to_string()))?;

    let entries: Vec<(i64, Vec<f32>)> = missing
        .iter()
        .zip(vectors.iter())
        .map(|(&idx, v)| (items[idx].id, v.clone()))
        .collect();
    upsert_batch(conn, model, &entries)?;

    for (idx, vector) in missing.into_iter().zip(vectors) {
        items[idx].embedding = Some(vector);
    }
    tracing::debug!(count = entries.len(), "computed embeddings on cache miss");
    Ok(())
}
