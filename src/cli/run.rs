//! Run command implementation

use crate::config::Config;
use crate::feed::{CandleRefreshJob, HttpCandleFeed};
use crate::market::Asset;
use crate::model::GbmReachModel;
use crate::rebalance::RebalanceJob;
use crate::scheduler::{run_guarded, shutdown_channel, Job, JobGuard, Schedule, Scheduler};
use crate::settlement::SettlementJob;
use crate::store::{MarketStore, MemoryStore};
use crate::zones::ZoneGenerationJob;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run every job once in order and exit
    #[arg(long)]
    pub once: bool,
}

/// Jobs in control-flow order with their schedules
///
/// With a feed configured, generation runs after each completed refresh pass
/// so it always sees freshly committed candles.
fn build_jobs(config: &Config, store: Arc<dyn MarketStore>) -> anyhow::Result<Vec<(Arc<dyn Job>, Schedule)>> {
    let mut jobs: Vec<(Arc<dyn Job>, Schedule)> = Vec::new();
    let fx_pair = config.feed.quote_fx_pair.clone();

    let generation_schedule = if config.feed.api_keys.is_empty() {
        tracing::warn!("No feed API keys configured, candle refresh disabled");
        Schedule::Every(Duration::from_secs(config.generation.interval_secs))
    } else {
        let feed = Arc::new(HttpCandleFeed::new(&config.feed)?);
        jobs.push((
            Arc::new(CandleRefreshJob::new(
                store.clone(),
                feed,
                config.feed.clone(),
                config.generation.candle_interval.clone(),
            )),
            Schedule::Every(Duration::from_secs(config.feed.refresh_interval_secs)),
        ));
        Schedule::After(CandleRefreshJob::NAME)
    };

    jobs.push((
        Arc::new(ZoneGenerationJob::new(
            store.clone(),
            GbmReachModel::new(),
            config.generation.clone(),
            fx_pair.clone(),
        )),
        generation_schedule,
    ));
    jobs.push((
        Arc::new(RebalanceJob::new(store.clone(), config.rebalance.clone())),
        Schedule::Every(Duration::from_secs(config.rebalance.interval_secs)),
    ));
    jobs.push((
        Arc::new(SettlementJob::new(store, config.settlement.clone(), fx_pair)),
        Schedule::Every(Duration::from_secs(config.settlement.interval_secs)),
    ));

    Ok(jobs)
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::with_assets(
            config
                .assets
                .iter()
                .map(|a| Asset::new(a.ticker.clone(), a.group, a.price)),
        ));
        tracing::info!(assets = config.assets.len(), "Seeded in-memory store");

        let jobs = build_jobs(config, store)?;
        let (trigger, shutdown) = shutdown_channel();

        if self.once {
            for (job, _) in jobs {
                run_guarded(job, &JobGuard::new(), &shutdown).await;
            }
            return Ok(());
        }

        let mut scheduler = Scheduler::new(shutdown);
        for (job, schedule) in jobs {
            scheduler.register(job, schedule);
        }
        let handles = scheduler.start();

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown requested");
        trigger.trigger();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Job loop ended abnormally");
            }
        }

        Ok(())
    }
}
