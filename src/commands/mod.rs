pub mod aggregate;
pub mod ingest;
pub mod init;
pub mod profile;
pub mod stats;

use anyhow::{Context as _, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use interest_miner::{
    categorize::{CachingCategorizer, StaticCategorizer},
    config::Config,
    extractor::PageExtractor,
    store::{open_store, KeywordStore},
    text::TextNormalizer,
    tracker::Tracker,
};
use std::sync::Arc;

/// Output format for query commands
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Components shared by the commands, built once from the configuration
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn KeywordStore>,
    pub normalizer: Arc<TextNormalizer>,
}

impl AppContext {
    pub fn open(config: Config) -> Result<Self> {
        let store = open_store(&config.storage).with_context(|| {
            format!("Failed to open store at {}", config.storage.data_dir.display())
        })?;
        let normalizer = Arc::new(TextNormalizer::new(&config.text));
        Ok(Self {
            config,
            store,
            normalizer,
        })
    }

    pub fn tracker(&self) -> Tracker {
        let categorizer = CachingCategorizer::new(
            StaticCategorizer::from_config(&self.config.categorization),
            self.store.clone(),
        );
        Tracker::new(
            self.store.clone(),
            PageExtractor::new(self.normalizer.clone(), &self.config.text),
            Box::new(categorizer),
        )
    }
}

/// Date given on the command line, or now.
///
/// Accepts RFC 3339 and the client format `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn parse_date(date: Option<&str>) -> Result<DateTime<Utc>> {
    let Some(date) = date else {
        return Ok(Utc::now());
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").with_context(|| {
        format!(
            "Invalid date '{}': expected RFC 3339 or YYYY-MM-DD HH:MM:SS",
            date
        )
    })?;
    Ok(naive.and_utc())
}
