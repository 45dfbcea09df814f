use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::engine::rules::RuleBook;
use crate::error::EngineError;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GarbConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub scoring: ScoringConfig,
    /// Intent keyword tables and biases. The built-in tables cover the
    /// closed intent set; a config file can override any of them.
    pub rules: RuleBook,
    pub worker: WorkerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub model_dir: String,
}

/// Engine tuning. Loaded once at startup and passed explicitly into the
/// scorer and ranker — never read as ambient global state, so tests can
/// substitute alternate tuning freely.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of query↔item similarity in the raw item score.
    pub query_weight: f64,
    /// Weight of intent-seed↔item similarity in the raw item score.
    pub intent_weight: f64,
    /// Bonus when an item matches a "prefer" keyword for the intent/category.
    pub prefer_bonus: f64,
    /// Prefer bonus applied under strict intents (business, formal).
    pub strict_prefer_bonus: f64,
    /// Penalty when an item matches an "avoid" keyword.
    pub avoid_penalty: f64,
    /// Avoid penalty applied under strict intents.
    pub strict_avoid_penalty: f64,
    /// Ranked items kept per category before assembly.
    pub pool_size: usize,
    /// Smaller pool kept under strict intents, where the avoid filter has
    /// already removed rule-breaking items.
    pub strict_pool_size: usize,
    /// Candidate combinations generated per request.
    pub max_combinations: usize,
    /// Outfit score weight: required slots filled.
    pub completeness_weight: f64,
    /// Outfit score weight: mean item relevance.
    pub semantic_weight: f64,
    /// Outfit score weight: color harmony.
    pub harmony_weight: f64,
    /// Extra credit when ≥2 items match the intent's preferred keyword families.
    pub keyword_credit: f64,
    /// Outfits returned when the caller does not ask for a count.
    pub default_k: usize,
    /// Hard cap on the requested outfit count.
    pub max_k: usize,
    /// Queries longer than this are truncated (chars).
    pub max_query_len: usize,
    /// Intent label used when the query is empty.
    pub fallback_intent: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WorkerConfig {
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub batch_timeout_ms: u64,
}

impl Default for GarbConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            scoring: ScoringConfig::default(),
            rules: RuleBook::default(),
            worker: WorkerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8343,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_garb_dir()
            .join("wardrobe.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let model_dir = default_garb_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            model_dir,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            query_weight: 0.6,
            intent_weight: 0.4,
            prefer_bonus: 0.12,
            strict_prefer_bonus: 0.18,
            avoid_penalty: 0.15,
            strict_avoid_penalty: 0.35,
            pool_size: 8,
            strict_pool_size: 5,
            max_combinations: 10,
            completeness_weight: 0.35,
            semantic_weight: 0.35,
            harmony_weight: 0.30,
            keyword_credit: 0.05,
            default_k: 3,
            max_k: 10,
            max_query_len: 240,
            fallback_intent: "casual".into(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            batch_size: 32,
            batch_timeout_ms: 500,
        }
    }
}

/// Returns `~/.garb/`
pub fn default_garb_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".garb")
}

/// Returns the default config file path: `~/.garb/config.toml`
pub fn default_config_path() -> PathBuf {
    default_garb_dir().join("config.toml")
}

impl GarbConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            GarbConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (GARB_DB, GARB_PORT, GARB_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GARB_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("GARB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("GARB_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

impl ScoringConfig {
    /// Reject malformed tuning at startup. A failure here is fatal — the
    /// engine must not serve with weights it cannot reason about.
    pub fn validate(&self) -> Result<(), EngineError> {
        let weights = [
            ("query_weight", self.query_weight),
            ("intent_weight", self.intent_weight),
            ("completeness_weight", self.completeness_weight),
            ("semantic_weight", self.semantic_weight),
            ("harmony_weight", self.harmony_weight),
            ("prefer_bonus", self.prefer_bonus),
            ("strict_prefer_bonus", self.strict_prefer_bonus),
            ("avoid_penalty", self.avoid_penalty),
            ("strict_avoid_penalty", self.strict_avoid_penalty),
            ("keyword_credit", self.keyword_credit),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::Configuration(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        if self.query_weight + self.intent_weight == 0.0 {
            return Err(EngineError::Configuration(
                "query_weight and intent_weight cannot both be zero".into(),
            ));
        }
        if self.pool_size == 0 || self.strict_pool_size == 0 {
            return Err(EngineError::Configuration("pool sizes must be at least 1".into()));
        }
        if self.max_combinations == 0 {
            return Err(EngineError::Configuration(
                "max_combinations must be at least 1".into(),
            ));
        }
        if self.default_k == 0 || self.default_k > self.max_k {
            return Err(EngineError::Configuration(format!(
                "default_k must be in 1..=max_k ({}), got {}",
                self.max_k, self.default_k
            )));
        }
        if self.fallback_intent.parse::<crate::engine::intent::Intent>().is_err() {
            return Err(EngineError::Configuration(format!(
                "unknown fallback_intent: {}",
                self.fallback_intent
            )));
        }
        Ok(())
    }

    /// The configured fallback intent. Call [`Self::validate`] first.
    pub fn fallback_intent(&self) -> crate::engine::intent::Intent {
        self.fallback_intent
            .parse()
            .unwrap_or(crate::engine::intent::Intent::Casual)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
