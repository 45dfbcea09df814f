//! Background embedding refresh worker.
//!
//! Wardrobe writes enqueue "dirty" item ids on a bounded channel; a single
//! consumer drains them, accumulates up to `batch_size` ids (waiting at most
//! `batch_timeout`), embeds the batch in one encoder call, and commits every
//! vector in a single transaction. Batch failures are logged and the ids are
//! retried on the next drain — the loop itself never dies. Request-serving
//! threads never block on this worker; a cache miss is computed inline
//! instead (see [`super::cache::ensure_embeddings`]).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::mpsc;

use super::cache;
use super::EmbeddingProvider;
use crate::wardrobe::store;

/// Tuning for the refresh worker, taken from `[worker]` config.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub batch_timeout: Duration,
}

/// Handle for enqueueing dirty item ids. Cloneable; dropping all handles
/// shuts the worker down once the queue drains.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<i64>,
}

impl WorkerHandle {
    /// Mark an item dirty. Non-blocking; returns false if the queue is full
    /// (the item will still be embedded on the next cache miss).
    pub fn enqueue(&self, item_id: i64) -> bool {
        match self.tx.try_send(item_id) {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(item_id, "embedding queue full, dropping refresh request");
                false
            }
        }
    }
}

/// Pure batch-collection step: dedupe the queued ids and take up to
/// `batch_size` of them, preserving arrival order.
///
/// Separated from the drain loop so batching behavior is testable without a
/// clock.
pub fn plan_batch(pending: &mut VecDeque<i64>, batch_size: usize) -> Vec<i64> {
    let mut batch = Vec::with_capacity(batch_size.min(pending.len()));
    while batch.len() < batch_size {
        let Some(id) = pending.pop_front() else { break };
        if !batch.contains(&id) {
            batch.push(id);
        }
    }
    batch
}

/// Spawn the single-consumer drain loop on the tokio runtime.
pub fn spawn_worker(
    db: Arc<Mutex<Connection>>,
    provider: Arc<dyn EmbeddingProvider>,
    model: String,
    options: WorkerOptions,
) -> WorkerHandle {
    let (tx, rx) = mpsc::channel(options.queue_capacity.max(1));
    tokio::spawn(run_loop(rx, db, provider, model, options));
    WorkerHandle { tx }
}

async fn run_loop(
    mut rx: mpsc::Receiver<i64>,
    db: Arc<Mutex<Connection>>,
    provider: Arc<dyn EmbeddingProvider>,
    model: String,
    options: WorkerOptions,
) {
    tracing::info!("embedding refresh worker started");
    let mut pending: VecDeque<i64> = VecDeque::new();
    let mut closed = false;

    loop {
        // Block only here, at the batch-collection stage.
        if pending.is_empty() && !closed {
            match rx.recv().await {
                Some(id) => pending.push_back(id),
                None => closed = true,
            }
        }
        if !closed {
            let deadline = tokio::time::Instant::now() + options.batch_timeout;
            while pending.len() < options.batch_size {
                match tokio::time::timeout_at(deadline, rx.recv()).await {
                    Ok(Some(id)) => pending.push_back(id),
                    Ok(None) => {
                        closed = true;
                        break;
                    }
                    Err(_) => break, // timeout — process what we have
                }
            }
        }

        let batch = plan_batch(&mut pending, options.batch_size);
        if batch.is_empty() {
            if closed {
                break;
            }
            continue;
        }

        match refresh_batch(&db, provider.clone(), &model, &batch).await {
            Ok(count) => {
                tracing::debug!(count, "embedding batch committed");
            }
            Err(e) => {
                tracing::warn!(error = %e, ids = ?batch, "embedding batch failed, will retry");
                if closed {
                    // No more producers and the encoder is failing — give up.
                    break;
                }
                for id in batch.into_iter().rev() {
                    pending.push_front(id);
                }
                tokio::time::sleep(options.batch_timeout).await;
            }
        }
    }
    tracing::info!("embedding refresh worker stopped");
}

/// Embed one batch of items and commit all vectors atomically.
async fn refresh_batch(
    db: &Arc<Mutex<Connection>>,
    provider: Arc<dyn EmbeddingProvider>,
    model: &str,
    ids: &[i64],
) -> anyhow::Result<usize> {
    let items = {
        let conn = db.lock().map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        store::fetch_items(&conn, ids)?
    };
    if items.is_empty() {
        return Ok(0);
    }

    let texts: Vec<String> = items.iter().map(|it| it.searchable_text()).collect();
    let vectors = tokio::task::spawn_blocking(move || {
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        provider.embed_batch(&refs)
    })
    .await??;

    let entries: Vec<(i64, Vec<f32>)> = items
        .iter()
        .map(|it| it.id)
        .zip(vectors)
        .collect();

    let mut conn = db.lock().map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
    cache::upsert_batch(&mut conn, model, &entries)?;
    Ok(entries.len())
}
