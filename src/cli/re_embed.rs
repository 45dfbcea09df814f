//! CLI `re-embed` command — regenerate every cached vector with the current model.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use crate::config::GarbConfig;
use crate::db;
use crate::embedding::{self, cache};
use crate::wardrobe::store;

/// Re-embed the whole wardrobe with the currently configured model.
///
/// Vectors from other models are dropped first, so a crash mid-run leaves
/// only misses behind, never mixed-model vectors.
pub async fn re_embed(config: &GarbConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let mut conn = db::open_database(&db_path).context("failed to open database")?;

    let provider: Arc<dyn embedding::EmbeddingProvider> = Arc::from(
        embedding::create_provider(&config.embedding)
            .context("failed to create embedding provider")?,
    );

    let model = &config.embedding.model;
    cache::invalidate_other_models(&conn, model)?;

    let items = store::load_items(&conn, model)?;
    let total = items.len();
    if total == 0 {
        println!("No wardrobe items to re-embed.");
        return Ok(());
    }

    println!("Re-embedding {total} items with model '{model}'...");

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("##-"),
    );

    const BATCH_SIZE: usize = 32;
    for chunk in items.chunks(BATCH_SIZE) {
        let texts: Vec<String> = chunk.iter().map(|it| it.searchable_text()).collect();
        let provider = Arc::clone(&provider);

        let vectors = tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
            provider.embed_batch(&refs)
        })
        .await?
        .context("embedding batch failed")?;

        let entries: Vec<(i64, Vec<f32>)> =
            chunk.iter().map(|it| it.id).zip(vectors).collect();
        cache::upsert_batch(&mut conn, model, &entries)?;

        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();

    db::migrations::set_embedding_model(&conn, model)?;

    println!("Re-embedded {total} items with model '{model}'.");
    Ok(())
}
