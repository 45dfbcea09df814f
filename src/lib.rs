//! Occasion-aware outfit recommendations from a personal wardrobe.
//!
//! Garb takes a free-text occasion ("business meeting", "going to swim") and a
//! wardrobe of clothing items, and returns complete ranked outfits (top, bottom,
//! footwear, plus optional outerwear and accessories) with a human-readable
//! rationale for each.
//!
//! # Pipeline
//!
//! 1. **Intent classification** — the query is matched against seed phrases for a
//!    closed set of occasion labels via embedding similarity
//! 2. **Item scoring** — every wardrobe item is scored against the query and the
//!    detected intent, with per-intent keyword preferences applied
//! 3. **Assembly** — the top items per category are combined into a bounded set
//!    of candidate outfits
//! 4. **Ranking** — candidates are scored by semantic relevance, CIEDE2000 color
//!    harmony, completeness, and an intent bias, and the top-k are returned
//!
//! # Architecture
//!
//! - **Embeddings**: Local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions),
//!   cached per item in SQLite and refreshed by a background batch worker
//! - **Storage**: SQLite for the wardrobe and the embedding cache
//! - **Service**: HTTP API via axum, plus a one-shot CLI
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization, schema, and migrations
//! - [`embedding`] — Text-to-vector pipeline, cache, and background refresh worker
//! - [`engine`] — The recommendation engine: intent, scoring, assembly, ranking
//! - [`wardrobe`] — Wardrobe item model and storage plumbing

pub mod config;
pub mod db;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod wardrobe;
