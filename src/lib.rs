//! interest-miner: user-interest mining for web tracking data
//!
//! Turns the pages and searches a tracking client reports into per-user
//! interest profiles:
//! - Keyword frequency tables from page HTML (Spanish and English)
//! - Cumulative per-user keyword profiles, aggregated incrementally
//! - Purchase and travel intention scores from search history
//! - Category visit counts from visited domains
//!
//! Everything is persisted through a [`store::KeywordStore`] handed to each
//! component explicitly.

pub mod aggregation;
pub mod categorize;
pub mod config;
pub mod extractor;
pub mod intention;
pub mod store;
pub mod text;
pub mod tracker;
pub mod types;

pub use config::Config;
pub use types::*;
