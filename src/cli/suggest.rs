//! CLI `suggest` command — one-shot outfit recommendation in the terminal.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::GarbConfig;
use crate::db;
use crate::embedding::{self, cache};
use crate::engine::{Engine, ReasonCode};

/// Run the full pipeline once against the stored wardrobe and print the
/// ranked outfits.
pub async fn suggest(config: &GarbConfig, query: &str, k: Option<usize>) -> Result<()> {
    let db_path = config.resolved_db_path();
    let mut conn = db::open_database(&db_path).context("failed to open database")?;

    let provider: Arc<dyn embedding::EmbeddingProvider> = Arc::from(
        embedding::create_provider(&config.embedding)
            .context("failed to create embedding provider")?,
    );
    let engine = Engine::new(provider, config.rules.clone(), config.scoring.clone())?;

    let model = &config.embedding.model;
    let mut items = crate::wardrobe::store::load_items(&conn, model)?;
    if items.is_empty() {
        println!("Wardrobe is empty — add items first (POST /api/items while serving).");
        return Ok(());
    }
    cache::ensure_embeddings(&mut conn, engine.provider(), model, &mut items)?;

    let recommendation = engine.recommend(&items, query, k)?;

    println!("Intent: {}", recommendation.intent);
    if recommendation.outfits.is_empty() {
        match recommendation.reason {
            Some(ReasonCode::InsufficientInventory { category }) => {
                println!("No complete outfit possible: no usable items in '{category}'.");
            }
            None => println!("No outfits found."),
        }
        return Ok(());
    }

    for (rank, outfit) in recommendation.outfits.iter().enumerate() {
        println!();
        println!("#{} (score {:.1})", rank + 1, outfit.score);
        for item in &outfit.items {
            let color = item.color.as_deref().unwrap_or("-");
            println!("  {:<12} {} ({})", item.category.as_str(), item.kind, color);
        }
        println!("  {}", outfit.rationale);
    }

    Ok(())
}
