//! Engine error taxonomy.
//!
//! [`EngineError`] covers the failure modes a caller can observe. Configuration
//! problems are fatal at startup; encoder unavailability is transient and
//! retryable; insufficient inventory is an expected caller-level condition and
//! is also surfaced as a reason code on an empty result rather than an error
//! where the pipeline can complete.

use thiserror::Error;

use crate::wardrobe::Category;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed weights or rule tables. Fatal — the engine must not serve.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The embedding encoder is not loaded or failed. Transient; callers may retry.
    #[error("embedding encoder unavailable: {0}")]
    EncoderUnavailable(String),

    /// A required category has no items. Recoverable at the caller level.
    #[error("not enough items in category {category}")]
    InsufficientInventory { category: Category },

    /// The caller supplied an unusable request (e.g. k out of bounds).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Storage-layer failure (wardrobe or embedding cache).
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl EngineError {
    /// Whether a caller should retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EncoderUnavailable(_))
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
