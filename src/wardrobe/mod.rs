//! Wardrobe item model.
//!
//! Defines [`Category`] (the closed set of clothing slots) and [`InventoryItem`]
//! (one garment as supplied by the wardrobe store). The engine only ever reads
//! items for the duration of a request; persistence lives in [`store`].

pub mod stats;
pub mod store;

use serde::{Deserialize, Serialize};

/// The closed set of clothing categories an item can belong to.
///
/// Declaration order is meaningful: required outfit slots come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Top,
    Bottom,
    Footwear,
    /// Jackets, blazers, hoodies, cardigans. Optional outfit slot.
    Outerwear,
    /// Dresses, jumpsuits. Pooled but never combined into multi-slot outfits.
    OnePiece,
    /// Belts, watches, hats. Optional outfit slot.
    Accessories,
}

/// Categories that must all be present for an outfit to be rankable.
pub const REQUIRED_CATEGORIES: [Category; 3] =
    [Category::Top, Category::Bottom, Category::Footwear];

/// Categories that contribute an item when their pool is non-empty.
pub const OPTIONAL_CATEGORIES: [Category; 2] = [Category::Outerwear, Category::Accessories];

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Footwear => "footwear",
            Self::Outerwear => "outerwear",
            Self::OnePiece => "one-piece",
            Self::Accessories => "accessories",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    /// Parses canonical names plus the legacy aliases `layer` (outerwear) and
    /// `shoes` (footwear) still found in older wardrobe exports.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "footwear" | "shoes" => Ok(Self::Footwear),
            "outerwear" | "layer" => Ok(Self::Outerwear),
            "one-piece" | "onepiece" | "one piece" => Ok(Self::OnePiece),
            "accessories" | "accessory" => Ok(Self::Accessories),
            _ => Err(format!("unknown category: {s}")),
        }
    }
}

/// One wardrobe item, as supplied by the wardrobe store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Stable integer identifier, owned by the wardrobe store.
    pub id: i64,
    /// Free-text type label, e.g. "dress shirt" or "running sneakers".
    #[serde(rename = "type")]
    pub kind: String,
    /// Color name, e.g. "navy" or "light blue". Optional.
    #[serde(default)]
    pub color: Option<String>,
    /// Clothing slot this item fills.
    pub category: Category,
    /// Long-form description; preferred text for embedding when present.
    #[serde(default)]
    pub description: Option<String>,
    /// Cached embedding vector, if the store has one for the current model.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub embedding: Option<Vec<f32>>,
}

impl InventoryItem {
    /// The text fed to the embedding provider and to keyword matching.
    ///
    /// Joins type, color, description, and category name; items whose fields
    /// are all empty yield an empty string and are skipped by the scorer.
    pub fn searchable_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(4);
        if !self.kind.is_empty() {
            parts.push(&self.kind);
        }
        if let Some(color) = self.color.as_deref() {
            if !color.is_empty() {
                parts.push(color);
            }
        }
        if let Some(desc) = self.description.as_deref() {
            if !desc.is_empty() {
                parts.push(desc);
            }
        }
        parts.push(self.category.as_str());
        parts.join(" ")
    }

    /// Lowercased searchable text, for case-insensitive keyword containment.
    pub fn keyword_text(&self) -> String {
        self.searchable_text().to_lowercase()
    }
}
