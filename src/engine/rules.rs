//! Intent keyword rule tables.
//!
//! Each intent carries a bias constant and, per category, sets of "prefer" and
//! "avoid" keywords matched by case-insensitive substring containment against
//! an item's text. The tables are plain data: loaded once at startup,
//! validated, and passed explicitly into the scorer and ranker so tests can
//! substitute alternate rule books without process-wide side effects.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::engine::intent::Intent;
use crate::error::EngineError;
use crate::wardrobe::Category;

/// Prefer/avoid keyword sets for one (intent, category) pair.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryRule {
    pub prefer: Vec<String>,
    pub avoid: Vec<String>,
}

/// Rules and bias for one intent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IntentRule {
    /// Flat score bonus applied to every outfit under this intent. Keeps
    /// values small (0.01–0.10) so it breaks ties without drowning the
    /// weighted terms.
    pub bias: f64,
    pub categories: BTreeMap<Category, CategoryRule>,
}

/// A pool demotion triggered by words in the raw query, e.g. "party at
/// night" drops shorts from the bottom pool when alternatives remain.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryNudge {
    pub intent: Intent,
    /// Any of these substrings in the lowercased query activates the nudge.
    pub query_terms: Vec<String>,
    pub category: Category,
    /// Pool items containing any of these keywords are dropped, but only if
    /// at least one item survives.
    pub demote: Vec<String>,
}

/// The complete immutable rule configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuleBook {
    pub intents: BTreeMap<Intent, IntentRule>,
    /// Intents with a dress code: larger keyword adjustments, and avoid
    /// matches are filtered from pools outright when alternatives remain.
    pub strict_intents: BTreeSet<Intent>,
    pub nudges: Vec<QueryNudge>,
}

impl RuleBook {
    pub fn rule(&self, intent: Intent, category: Category) -> Option<&CategoryRule> {
        self.intents.get(&intent)?.categories.get(&category)
    }

    /// Bias for an intent; unknown intents get a small default.
    pub fn bias(&self, intent: Intent) -> f64 {
        self.intents.get(&intent).map(|r| r.bias).unwrap_or(0.02)
    }

    pub fn is_strict(&self, intent: Intent) -> bool {
        self.strict_intents.contains(&intent)
    }

    /// Prefer keywords matched by `text` for this (intent, category).
    pub fn matched_prefer<'a>(
        &'a self,
        intent: Intent,
        category: Category,
        text: &str,
    ) -> Vec<&'a str> {
        self.rule(intent, category)
            .map(|r| contained(&r.prefer, text))
            .unwrap_or_default()
    }

    /// Avoid keywords matched by `text` for this (intent, category).
    pub fn matched_avoid<'a>(
        &'a self,
        intent: Intent,
        category: Category,
        text: &str,
    ) -> Vec<&'a str> {
        self.rule(intent, category)
            .map(|r| contained(&r.avoid, text))
            .unwrap_or_default()
    }

    /// Whether `text` matches any prefer keyword of the intent, across all
    /// categories. Used by the ranker's appropriateness credit.
    pub fn matches_prefer_family(&self, intent: Intent, text: &str) -> bool {
        self.intents
            .get(&intent)
            .map(|rule| {
                rule.categories
                    .values()
                    .any(|cr| !contained(&cr.prefer, text).is_empty())
            })
            .unwrap_or(false)
    }

    /// Reject malformed rule data at startup.
    pub fn validate(&self) -> Result<(), EngineError> {
        for (intent, rule) in &self.intents {
            if !rule.bias.is_finite() || !(0.0..=1.0).contains(&rule.bias) {
                return Err(EngineError::Configuration(format!(
                    "bias for {intent} must be in [0, 1], got {}",
                    rule.bias
                )));
            }
            for (category, cr) in &rule.categories {
                for kw in cr.prefer.iter().chain(&cr.avoid) {
                    if kw.trim().is_empty() {
                        return Err(EngineError::Configuration(format!(
                            "empty keyword in rules for {intent}/{category}"
                        )));
                    }
                    if kw.chars().any(|c| c.is_uppercase()) {
                        return Err(EngineError::Configuration(format!(
                            "keyword '{kw}' for {intent}/{category} must be lowercase \
                             (matching is lowercase substring containment)"
                        )));
                    }
                }
            }
        }
        for nudge in &self.nudges {
            if nudge.query_terms.is_empty() || nudge.demote.is_empty() {
                return Err(EngineError::Configuration(
                    "query nudge needs at least one trigger term and one demote keyword".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Keywords from `set` contained in `text` (already lowercased).
fn contained<'a>(set: &'a [String], text: &str) -> Vec<&'a str> {
    set.iter()
        .filter(|kw| text.contains(kw.as_str()))
        .map(|kw| kw.as_str())
        .collect()
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn rule(prefer: &[&str], avoid: &[&str]) -> CategoryRule {
    CategoryRule {
        prefer: keywords(prefer),
        avoid: keywords(avoid),
    }
}

impl Default for RuleBook {
    /// The built-in tuning. Every entry is overridable from config.
    fn default() -> Self {
        use Category::*;
        let mut intents = BTreeMap::new();

        intents.insert(
            Intent::Business,
            IntentRule {
                bias: 0.05,
                categories: BTreeMap::from([
                    (Top, rule(&["shirt", "button-down", "polo"], &["t-shirt", "hoodie", "tee"])),
                    (
                        Bottom,
                        rule(
                            &["chino", "dress pant", "suit pant", "trouser", "pant"],
                            &["short", "jogger", "fleece", "sweatpant"],
                        ),
                    ),
                    (
                        Footwear,
                        rule(
                            &["loafer", "boot", "dress"],
                            &["sneaker", "slide", "sandal", "athletic", "running", "trainer"],
                        ),
                    ),
                    (Outerwear, rule(&["blazer"], &["hoodie"])),
                ]),
            },
        );

        intents.insert(
            Intent::Formal,
            IntentRule {
                bias: 0.05,
                categories: BTreeMap::from([
                    (Top, rule(&["dress shirt"], &["t-shirt", "hoodie", "tee"])),
                    (
                        Bottom,
                        rule(
                            &["suit pant", "dress pant", "trouser"],
                            &["jean", "short", "jogger", "fleece", "sweatpant"],
                        ),
                    ),
                    (
                        Footwear,
                        rule(
                            &["dress", "loafer"],
                            &["sneaker", "slide", "sandal", "athletic", "running", "trainer"],
                        ),
                    ),
                    (Outerwear, rule(&["blazer"], &["hoodie"])),
                ]),
            },
        );

        intents.insert(
            Intent::Party,
            IntentRule {
                bias: 0.04,
                categories: BTreeMap::from([
                    (Top, rule(&["dress shirt", "button-down"], &[])),
                    (Bottom, rule(&["chino", "suit pant", "dark jean"], &[])),
                    (Footwear, rule(&["loafer", "boot", "sneaker"], &["slide", "sandal"])),
                    (Outerwear, rule(&["blazer"], &[])),
                ]),
            },
        );

        intents.insert(
            Intent::Casual,
            IntentRule {
                bias: 0.03,
                categories: BTreeMap::from([
                    (Top, rule(&["t-shirt", "polo", "sweater"], &[])),
                    (Bottom, rule(&["jean", "chino"], &[])),
                    (Footwear, rule(&["sneaker", "boot"], &[])),
                    (Outerwear, rule(&["hoodie", "jacket", "cardigan"], &[])),
                ]),
            },
        );

        intents.insert(
            Intent::Workout,
            IntentRule {
                bias: 0.05,
                categories: BTreeMap::from([
                    (Top, rule(&["t-shirt", "tank"], &["dress shirt"])),
                    (Bottom, rule(&["short"], &["jean", "chino", "dress pant"])),
                    (Footwear, rule(&["sneaker"], &["loafer", "boot", "dress shoe"])),
                    (Outerwear, rule(&["hoodie"], &["blazer"])),
                ]),
            },
        );

        intents.insert(
            Intent::Beach,
            IntentRule {
                bias: 0.04,
                categories: BTreeMap::from([
                    (Top, rule(&["t-shirt"], &["dress shirt"])),
                    (Bottom, rule(&["short"], &["jean", "chino"])),
                    (
                        Footwear,
                        rule(&["sandal", "slide", "flip"], &["loafer", "dress", "sneaker", "oxford"]),
                    ),
                    (Outerwear, rule(&[], &["blazer", "sweater"])),
                ]),
            },
        );

        intents.insert(
            Intent::Hiking,
            IntentRule {
                bias: 0.02,
                categories: BTreeMap::from([
                    (Top, rule(&["t-shirt"], &["dress shirt"])),
                    (Bottom, rule(&["pant"], &["short"])),
                    (
                        Footwear,
                        rule(&["boot", "hiking"], &["loafer", "dress", "slide", "sandal", "sneaker"]),
                    ),
                    (Outerwear, rule(&["jacket"], &["blazer"])),
                ]),
            },
        );

        let nudges = vec![
            QueryNudge {
                intent: Intent::Party,
                query_terms: keywords(&["night", "evening"]),
                category: Bottom,
                demote: keywords(&["short"]),
            },
            QueryNudge {
                intent: Intent::Party,
                query_terms: keywords(&["night", "evening"]),
                category: Outerwear,
                demote: keywords(&["hoodie"]),
            },
            QueryNudge {
                intent: Intent::Hiking,
                query_terms: keywords(&["cold", "cool", "chilly"]),
                category: Bottom,
                demote: keywords(&["short"]),
            },
        ];

        Self {
            intents,
            strict_intents: BTreeSet::from([Intent::Business, Intent::Formal]),
            nudges,
        }
    }
}
