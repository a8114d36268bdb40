//! Odds rebalancer
//!
//! Re-prices zones that have not started yet from the volume wagered on
//! them. Zones are grouped by (ticker, timeframe, start, currency) and each
//! group is priced by the configured [`RebalancePolicy`].

mod decay;
mod policy;

pub use decay::decay_factor;
pub use policy::RebalancePolicy;

use crate::config::RebalanceConfig;
use crate::market::{to_f64, Currency, Zone, ZoneId};
use crate::model::odds_to_decimal;
use crate::scheduler::{Job, PassReport, Shutdown};
use crate::store::MarketStore;
use crate::telemetry::{incr_counter, CounterMetric, LatencyMetric};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

type GroupKey = (String, u32, DateTime<Utc>, Currency);
type SeriesKey = (String, u32, Currency);

/// Unstarted active zones grouped by period, with each group's period index
fn group_zones(zones: Vec<Zone>, now: DateTime<Utc>) -> Vec<(usize, usize, Vec<Zone>)> {
    let mut groups: BTreeMap<GroupKey, Vec<Zone>> = BTreeMap::new();
    for zone in zones.into_iter().filter(|z| z.active && !z.has_started(now)) {
        groups
            .entry((zone.ticker.clone(), zone.timeframe_hours, zone.start_time, zone.currency))
            .or_default()
            .push(zone);
    }

    let mut starts: HashMap<SeriesKey, BTreeSet<DateTime<Utc>>> = HashMap::new();
    for (ticker, hours, start, currency) in groups.keys() {
        starts
            .entry((ticker.clone(), *hours, *currency))
            .or_default()
            .insert(*start);
    }

    groups
        .into_iter()
        .map(|((ticker, hours, start, currency), zones)| {
            let series = &starts[&(ticker, hours, currency)];
            let index = series.iter().position(|s| *s == start).unwrap_or(0);
            (index, series.len(), zones)
        })
        .collect()
}

/// Scheduled job re-pricing zones from wagered volume
pub struct RebalanceJob {
    store: Arc<dyn MarketStore>,
    policy: RebalancePolicy,
    config: RebalanceConfig,
}

impl RebalanceJob {
    pub fn new(store: Arc<dyn MarketStore>, config: RebalanceConfig) -> Self {
        Self {
            store,
            policy: RebalancePolicy::from_config(&config),
            config,
        }
    }

    /// New odds for one group, or `None` when nothing has been wagered
    async fn rebalance_group(
        &self,
        zones: &[Zone],
        decay: f64,
    ) -> anyhow::Result<Option<Vec<Zone>>> {
        let ids: Vec<ZoneId> = zones.iter().map(|z| z.id).collect();
        let volumes = self.store.get_wager_volume_by_zone(&ids).await?;
        let amounts: Vec<f64> = ids
            .iter()
            .map(|id| volumes.get(id).copied().map(to_f64).unwrap_or(0.0))
            .collect();
        if amounts.iter().sum::<f64>() <= 0.0 {
            return Ok(None);
        }

        let odds = self.policy.odds(&amounts, decay);
        let changed = zones
            .iter()
            .zip(odds)
            .filter_map(|(zone, odds)| {
                let target_odds = odds_to_decimal(odds);
                (target_odds != zone.target_odds).then(|| Zone {
                    target_odds,
                    ..zone.clone()
                })
            })
            .collect();
        Ok(Some(changed))
    }
}

#[async_trait]
impl Job for RebalanceJob {
    fn name(&self) -> &'static str {
        "odds_rebalance"
    }

    fn latency_metric(&self) -> LatencyMetric {
        LatencyMetric::RebalancePass
    }

    async fn run_pass(&self, now: DateTime<Utc>, shutdown: &Shutdown) -> anyhow::Result<PassReport> {
        let groups = group_zones(self.store.get_all_active_zones().await?, now);

        let mut tx = self.store.begin_transaction();
        let mut report = PassReport::default();
        let mut updated: HashMap<ZoneId, Zone> = HashMap::new();

        for (index, period_count, zones) in groups {
            if shutdown.is_triggered() {
                self.store.rollback(tx);
                return Ok(PassReport::cancelled(report.processed));
            }
            report.processed += 1;

            let decay = decay_factor(index, period_count, self.config.max_decay, self.config.decay_floor);
            match self.rebalance_group(&zones, decay).await {
                Ok(Some(changed)) => {
                    for zone in changed {
                        tracing::debug!(zone_id = %zone.id, ticker = %zone.ticker, odds = %zone.target_odds, "Zone re-priced");
                        tx.set_zone_odds(zone.id, zone.target_odds);
                        updated.insert(zone.id, zone);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    let ticker = zones.first().map(|z| z.ticker.as_str()).unwrap_or_default();
                    tracing::warn!(ticker, error = %e, "Rebalance skipped group");
                    report.skipped += 1;
                }
            }
        }

        if !updated.is_empty() {
            // Re-read so zones superseded during the pass do not feed the cache
            let current: Vec<Zone> = self
                .store
                .get_all_active_zones()
                .await?
                .into_iter()
                .map(|z| match updated.get(&z.id) {
                    Some(repriced) => Zone {
                        target_odds: repriced.target_odds,
                        ..z
                    },
                    None => z,
                })
                .collect();
            let touched: BTreeSet<&str> = updated.values().map(|z| z.ticker.as_str()).collect();
            for mut asset in self.store.get_all_assets().await? {
                if touched.contains(asset.ticker.as_str()) && asset.refresh_max_odd(&current) {
                    tx.set_max_odd(&asset);
                }
            }
        }

        report.changed = updated.len();
        self.store
            .commit(tx)
            .await
            .context("rebalance commit failed, pass rolled back")?;
        incr_counter(CounterMetric::ZonesRebalanced, updated.len() as u64);
        Ok(report)
    }
}
