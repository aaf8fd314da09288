//! Configuration for interest-miner

mod aggregation;
mod categorization;
mod intention;
mod logging;
mod storage;
mod text;

pub use aggregation::AggregationConfig;
pub use categorization::CategorizationConfig;
pub use intention::IntentionConfig;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use storage::{StorageBackend, StorageConfig};
pub use text::TextConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Document store configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Text normalization policy
    #[serde(default)]
    pub text: TextConfig,
    /// Keyword aggregation job
    #[serde(default)]
    pub aggregation: AggregationConfig,
    /// Intention scoring
    #[serde(default)]
    pub intention: IntentionConfig,
    /// Domain categorization
    #[serde(default)]
    pub categorization: CategorizationConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // Storage
        if self.storage.backend == StorageBackend::Sled
            && self.storage.data_dir.as_os_str().is_empty()
        {
            errors.push("data_dir must not be empty for the sled backend".to_string());
        }

        // Text
        if self.text.max_word_length < 2 {
            errors.push("max_word_length must be at least 2".to_string());
        }
        if self.text.extra_stopwords.iter().any(|w| w.trim().is_empty()) {
            errors.push("extra_stopwords must not contain empty words".to_string());
        }

        // Aggregation
        if self.aggregation.interval_secs == 0 {
            errors.push("aggregation interval_secs must be positive".to_string());
        }

        // Intention
        if self.intention.window_days <= 0 {
            errors.push("intention window_days must be positive".to_string());
        }
        if self.intention.window_days > 3650 {
            errors.push("intention window_days must be <= 3650".to_string());
        }

        // Categorization
        for (domain, categories) in &self.categorization.domains {
            if domain.trim().is_empty() {
                errors.push("categorization domains must not contain an empty domain".to_string());
            }
            if categories.iter().any(|c| c.trim().is_empty()) {
                errors.push(format!("domain '{}' has an empty category name", domain));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}
