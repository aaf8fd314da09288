use anyhow::{Context, Result};
use interest_miner::config::Config;
use std::path::Path;

use super::{parse_date, AppContext};

pub fn ingest_html(
    config: Config,
    user: &str,
    url: &str,
    file: &Path,
    date: Option<&str>,
) -> Result<()> {
    let date = parse_date(date)?;
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read HTML file {}", file.display()))?;

    let ctx = AppContext::open(config)?;
    let record = ctx.tracker().record_page_html(user, url, &html, date)?;
    ctx.store.flush()?;

    println!(
        "Stored page record {} ({}, {} text keywords, {} metadata keywords)",
        record.id,
        record.language,
        record.keyword_freqs.text.len(),
        record.keyword_freqs.metadata.len()
    );
    Ok(())
}

pub fn ingest_visit(config: Config, user: &str, url: &str, date: Option<&str>) -> Result<()> {
    let date = parse_date(date)?;
    let ctx = AppContext::open(config)?;

    let result = ctx.tracker().record_page_visit(user, url, date);
    ctx.store.flush()?;
    let tracked = result?;

    if tracked.categories.is_empty() {
        println!("Logged visit to {} (uncategorized)", tracked.visit.domain);
    } else {
        let categories: Vec<&str> = tracked.categories.iter().map(String::as_str).collect();
        println!(
            "Logged visit to {} [{}]",
            tracked.visit.domain,
            categories.join(", ")
        );
    }
    Ok(())
}

pub fn ingest_search(config: Config, user: &str, query: &str, date: Option<&str>) -> Result<()> {
    let date = parse_date(date)?;
    let ctx = AppContext::open(config)?;

    let search = ctx.tracker().record_search(user, query, date)?;
    ctx.store.flush()?;

    println!("Stored search {} at {}", search.id, search.date);
    Ok(())
}
