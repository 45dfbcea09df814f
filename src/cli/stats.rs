use anyhow::Result;

use crate::config::GarbConfig;
use crate::wardrobe::{stats, Category};

/// Display wardrobe statistics in the terminal.
pub fn stats(config: &GarbConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let response = stats::collect_stats(&conn, &config.embedding.model)?;

    println!("Wardrobe Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total items:         {}", response.total_items);
    println!();

    println!("By Category:");
    for c in [
        Category::Top,
        Category::Bottom,
        Category::Footwear,
        Category::Outerwear,
        Category::OnePiece,
        Category::Accessories,
    ] {
        let count = response.by_category.get(c.as_str()).copied().unwrap_or(0);
        println!("  {:<12} {}", c.as_str(), count);
    }
    println!();

    println!("Embedded items:        {}", response.embedded_items);
    println!("Stale embeddings:      {}", response.stale_embeddings);
    if response.stale_embeddings > 0 {
        println!("  (run `garb re-embed` to refresh)");
    }

    Ok(())
}
