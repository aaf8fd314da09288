//! Domain categorization configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static domain categories used by the built-in categorizer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizationConfig {
    /// domain -> category names
    pub domains: BTreeMap<String, Vec<String>>,
}
