use anyhow::Result;
use interest_miner::aggregation::KeywordAggregator;
use interest_miner::config::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::AppContext;

/// Run one aggregation pass, or one pass every `interval_secs` until Ctrl-C
pub async fn run_aggregation(config: Config, interval_secs: Option<u64>) -> Result<()> {
    let ctx = AppContext::open(config)?;
    let aggregator = Arc::new(KeywordAggregator::new(ctx.store.clone()));

    let Some(secs) = interval_secs else {
        let pass = aggregator.clone();
        let report = tokio::task::spawn_blocking(move || pass.run_aggregation_pass()).await??;
        ctx.store.flush()?;
        println!("Aggregation: {}", report);
        return Ok(());
    };

    if secs == 0 {
        anyhow::bail!("interval must be positive");
    }

    info!("Running aggregation every {}s, press Ctrl-C to stop", secs);
    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let pass = aggregator.clone();
                match tokio::task::spawn_blocking(move || pass.run_aggregation_pass()).await? {
                    Ok(report) => {
                        if report.failed > 0 {
                            error!("{} records failed to aggregate; they stay pending", report.failed);
                        }
                    }
                    Err(e) => error!("Aggregation pass failed: {}", e),
                }
                if let Err(e) = ctx.store.flush() {
                    error!("Failed to flush store: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping aggregation");
                break;
            }
        }
    }

    ctx.store.flush()?;
    Ok(())
}
