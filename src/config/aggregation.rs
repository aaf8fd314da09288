//! Keyword aggregation job configuration

use serde::{Deserialize, Serialize};

/// Aggregation job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Seconds between passes when running periodically
    pub interval_secs: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}
