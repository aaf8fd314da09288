use anyhow::Result;
use interest_miner::config::Config;
use tracing::info;

use super::AppContext;

pub fn show_stats(config: Config) -> Result<()> {
    info!("Loading store statistics...");
    let ctx = AppContext::open(config)?;
    let stats = ctx.store.stats()?;

    println!("\ninterest-miner Statistics");
    println!("=========================");
    println!("Backend:             {:?}", ctx.config.storage.backend);
    println!("Data directory:      {}", ctx.config.storage.data_dir.display());
    println!("Page records:        {}", stats.pages);
    println!("  pending aggregation: {}", stats.unprocessed_pages);
    println!("User profiles:       {}", stats.profiles);
    println!("Searches:            {}", stats.searches);
    println!("Page visits:         {}", stats.visits);
    println!("Categorized domains: {}", stats.cached_domains);

    Ok(())
}
