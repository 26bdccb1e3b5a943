//! Search tuning knobs.
//!
//! Defaults reproduce the shipped ranking behavior. Values can be loaded from
//! JSON or overridden through `STACKLINKS_*` environment variables.

use crate::interface::StacklinksError;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::warn;

/// Quiet period after the last keystroke before ranking runs
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// A term must score above this on a field for the all-terms bonus to apply.
/// Tunable; it has no meaning beyond "matched reasonably well".
pub const DEFAULT_GOOD_MATCH_THRESHOLD: f64 = 20.0;

/// Multiplier applied to a text field when every term matched well
pub const DEFAULT_ALL_TERMS_BONUS: f64 = 1.2;

pub const ENV_DEBOUNCE_MS: &str = "STACKLINKS_DEBOUNCE_MS";
pub const ENV_MAX_RESULTS: &str = "STACKLINKS_MAX_RESULTS";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(rename = "debounce_ms", deserialize_with = "deserialize_millis")]
    pub debounce: Duration,
    pub good_match_threshold: f64,
    pub all_terms_bonus: f64,
    /// Cap on each ranked list; `None` keeps every match. Zero means no cap.
    #[serde(deserialize_with = "deserialize_limit")]
    pub max_results: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            good_match_threshold: DEFAULT_GOOD_MATCH_THRESHOLD,
            all_terms_bonus: DEFAULT_ALL_TERMS_BONUS,
            max_results: None,
        }
    }
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

fn deserialize_limit<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<usize>::deserialize(deserializer).map(|limit| limit.filter(|&n| n > 0))
}

impl SearchConfig {
    /// Parse a JSON document; missing keys fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, StacklinksError> {
        serde_json::from_str(json).map_err(|e| StacklinksError::InvalidInput(e.to_string()))
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup. Unparseable values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_DEBOUNCE_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.debounce = Duration::from_millis(ms),
                Err(_) => warn!(key = ENV_DEBOUNCE_MS, value = %raw, "ignoring invalid override"),
            }
        }
        if let Some(raw) = lookup(ENV_MAX_RESULTS) {
            match raw.trim().parse::<usize>() {
                Ok(n) => self = self.with_max_results(Some(n)),
                Err(_) => warn!(key = ENV_MAX_RESULTS, value = %raw, "ignoring invalid override"),
            }
        }
        self
    }

    /// Set the result cap; `Some(0)` is treated as no cap.
    pub fn with_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results.filter(|&n| n > 0);
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}
