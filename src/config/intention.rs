//! Intention scoring configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::intention::RELEVANT_INTENTION_DAYS;

/// Intention scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentionConfig {
    /// Only searches from the last `window_days` days are scored
    pub window_days: i64,
    /// Extra lexicons, TOML files of `word = weight`
    pub lexicon_paths: Vec<PathBuf>,
}

impl Default for IntentionConfig {
    fn default() -> Self {
        Self {
            window_days: RELEVANT_INTENTION_DAYS,
            lexicon_paths: Vec::new(),
        }
    }
}
