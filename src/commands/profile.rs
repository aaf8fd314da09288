use anyhow::{Context, Result};
use interest_miner::{
    categorize::domains_by_category,
    config::Config,
    intention::{load_lexicons, ranked, IntentionScorer},
    types::KeywordKind,
};
use serde_json::json;

use super::{AppContext, OutputFormat};

pub fn show_keywords(
    config: Config,
    user: &str,
    kind: KeywordKind,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let ctx = AppContext::open(config)?;
    let profile = ctx.store.load_profile(user)?;
    let limit = (limit > 0).then_some(limit);
    let keywords = profile.top_keywords(kind, limit);

    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = keywords
                .iter()
                .map(|(word, count)| json!({ "keyword": word, "count": count }))
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "user": user,
                    "kind": kind.to_string(),
                    "records_merged": profile.merged_records.len(),
                    "keywords": entries,
                }))?
            );
        }
        OutputFormat::Text => {
            println!("\n{} keywords of {} ({} pages merged)", kind, user, profile.merged_records.len());
            println!("{}", "=".repeat(40));
            if keywords.is_empty() {
                println!("No keywords yet. Run `interest-miner aggregate` after ingesting pages.");
            }
            for (word, count) in &keywords {
                println!("{:>8}  {}", count, word);
            }
        }
    }
    Ok(())
}

pub fn show_intentions(
    config: Config,
    user: &str,
    lexicon_name: &str,
    window_days: Option<i64>,
    format: OutputFormat,
) -> Result<()> {
    let window_days = window_days.unwrap_or(config.intention.window_days);
    if window_days <= 0 {
        anyhow::bail!("window_days must be positive");
    }

    let ctx = AppContext::open(config)?;
    let lexicons = load_lexicons(&ctx.config.intention.lexicon_paths, &ctx.normalizer)
        .context("Failed to load intention lexicons")?;
    let available: Vec<&str> = lexicons.iter().map(|l| l.name()).collect();
    let lexicon = lexicons
        .iter()
        .find(|l| l.name() == lexicon_name)
        .with_context(|| {
            format!(
                "Unknown lexicon '{}' (available: {})",
                lexicon_name,
                available.join(", ")
            )
        })?;

    let scorer = IntentionScorer::new(ctx.store.clone(), ctx.normalizer.clone());
    let groups = ranked(scorer.compute_intentions(user, lexicon, window_days)?);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&groups)?);
        }
        OutputFormat::Text => {
            println!(
                "\n{} intentions of {} (last {} days)",
                lexicon.name(),
                user,
                window_days
            );
            println!("{}", "=".repeat(60));
            if groups.is_empty() {
                println!("No relevant searches.");
            }
            for group in &groups {
                let label = group.label();
                println!(
                    "{:.3}  immediate {:.3}  continuous {:.3}  {} search(es)  {}",
                    group.scores.smart_index,
                    group.scores.immediate_index,
                    group.scores.continuous_index,
                    group.dates.len(),
                    if label.is_empty() { "(no subject)" } else { label.as_str() },
                );
            }
        }
    }
    Ok(())
}

pub fn show_categories(config: Config, user: &str, format: OutputFormat) -> Result<()> {
    let ctx = AppContext::open(config)?;
    let visits = ctx.store.category_visits(user)?;
    let domains = domains_by_category(ctx.store.as_ref(), user)?;

    let mut by_visits: Vec<(&String, &u64)> = visits.iter().collect();
    by_visits.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = by_visits
                .iter()
                .map(|(category, count)| {
                    json!({
                        "category": category,
                        "visits": count,
                        "domains": domains.get(*category),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            println!("\nCategories visited by {}", user);
            println!("{}", "=".repeat(40));
            if by_visits.is_empty() {
                println!("No categorized visits.");
            }
            for (category, count) in by_visits {
                println!("{:>6}  {}", count, category);
                if let Some(domains) = domains.get(category) {
                    for domain in domains {
                        println!("          {}", domain);
                    }
                }
            }
        }
    }
    Ok(())
}
