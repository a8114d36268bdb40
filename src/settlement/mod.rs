//! Settlement engine
//!
//! Drives each wager through `Active -> {Lost | Won} -> Finished -> Paid`.
//! A zone is lost as soon as a candle in its window leaves the zone bounds;
//! once the window plus a grace period has elapsed, remaining wagers are
//! finished as won and paid `amount * origin_odds`.
//!
//! Every transition only moves forward, so re-running a pass on the same
//! data changes nothing and never pays twice.

mod breach;

pub use breach::find_breach;

use crate::config::SettlementConfig;
use crate::market::{Currency, Wager, WagerId, WagerStatus, Zone, ZoneId};
use crate::scheduler::{Job, PassReport, Shutdown};
use crate::store::{MarketStore, Transaction};
use crate::telemetry::{incr_counter, CounterMetric, LatencyMetric};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

const MAX_GRACE_SECS: u64 = 7 * 24 * 3600;

/// Counts from settling one zone
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ZoneOutcome {
    lost: usize,
    won: usize,
    paid: usize,
}

impl ZoneOutcome {
    fn changed(&self) -> usize {
        self.lost + self.won
    }
}

/// Credit the payout of a finished, won wager and mark it paid
fn pay(tx: &mut Transaction, wager: &mut Wager) {
    tx.credit_balance(wager.user_id, wager.currency, wager.payout());
    wager.paid = true;
    tracing::info!(wager_id = %wager.id, user_id = %wager.user_id, payout = %wager.payout(), "Wager paid");
}

/// Scheduled job settling wagers against candle data
pub struct SettlementJob {
    store: Arc<dyn MarketStore>,
    config: SettlementConfig,
    fx_pair: String,
}

impl SettlementJob {
    /// `fx_pair` names the stored rate used to price EUR zones
    pub fn new(store: Arc<dyn MarketStore>, config: SettlementConfig, fx_pair: impl Into<String>) -> Self {
        Self {
            store,
            config,
            fx_pair: fx_pair.into(),
        }
    }

    fn grace(&self) -> Duration {
        Duration::seconds(self.config.grace_period_secs.min(MAX_GRACE_SECS) as i64)
    }

    /// Quote-currency units per unit of `currency`, `None` when unknown
    async fn fx_rate(&self, currency: Currency) -> anyhow::Result<Option<Decimal>> {
        match currency {
            Currency::Usd => Ok(Some(Decimal::ONE)),
            Currency::Eur => Ok(self
                .store
                .get_fx_rate(&self.fx_pair)
                .await?
                .filter(|r| *r > Decimal::ZERO)),
        }
    }

    /// Apply breach and finish transitions for the unfinished wagers of one zone
    async fn settle_zone(
        &self,
        zone: &Zone,
        wagers: Vec<Wager>,
        now: DateTime<Utc>,
        tx: &mut Transaction,
    ) -> anyhow::Result<ZoneOutcome> {
        let mut outcome = ZoneOutcome::default();
        if !zone.has_started(now) {
            return Ok(outcome);
        }

        let closing = now >= zone.end_time + self.grace();
        let window_end = if closing { zone.end_time } else { now.min(zone.end_time) };

        let Some(rate) = self.fx_rate(zone.currency).await? else {
            anyhow::bail!("no exchange rate for {:?} zone", zone.currency);
        };
        let candles = self
            .store
            .get_candles_between(&zone.ticker, &self.config.candle_interval, zone.start_time, window_end)
            .await?;
        let breach = find_breach(zone, &candles, rate);

        if let Some(candle) = breach {
            tracing::info!(
                zone_id = %zone.id,
                ticker = %zone.ticker,
                high = %candle.high,
                low = %candle.low,
                at = %candle.timestamp,
                "Zone breached"
            );
        }

        for mut wager in wagers {
            let mut dirty = false;

            if breach.is_some() && wager.status == WagerStatus::Active {
                wager.status = WagerStatus::Lost;
                outcome.lost += 1;
                dirty = true;
            }

            if closing {
                if wager.status == WagerStatus::Active {
                    wager.status = WagerStatus::Won;
                    outcome.won += 1;
                }
                wager.finished = true;
                dirty = true;
                if wager.awaiting_payout() {
                    pay(tx, &mut wager);
                    outcome.paid += 1;
                }
            }

            if dirty {
                tx.update_wager(wager);
            }
        }
        Ok(outcome)
    }
}

#[async_trait]
impl Job for SettlementJob {
    fn name(&self) -> &'static str {
        "settlement"
    }

    fn latency_metric(&self) -> LatencyMetric {
        LatencyMetric::SettlementPass
    }

    async fn run_pass(&self, now: DateTime<Utc>, shutdown: &Shutdown) -> anyhow::Result<PassReport> {
        let unfinished = self.store.get_unfinished_wagers().await?;
        let mut by_zone: BTreeMap<ZoneId, Vec<Wager>> = BTreeMap::new();
        for wager in unfinished {
            by_zone.entry(wager.zone_id).or_default().push(wager);
        }
        let ids: Vec<ZoneId> = by_zone.keys().copied().collect();
        let zones: HashMap<ZoneId, Zone> = self
            .store
            .get_zones(&ids)
            .await?
            .into_iter()
            .map(|z| (z.id, z))
            .collect();

        let mut tx = self.store.begin_transaction();
        let mut report = PassReport::default();
        let mut totals = ZoneOutcome::default();
        let mut settled: HashSet<WagerId> = HashSet::new();

        for (zone_id, wagers) in by_zone {
            if shutdown.is_triggered() {
                self.store.rollback(tx);
                return Ok(PassReport::cancelled(report.processed));
            }
            report.processed += 1;

            let Some(zone) = zones.get(&zone_id) else {
                tracing::warn!(zone_id = %zone_id, "Wagers reference an unknown zone, skipping");
                report.skipped += 1;
                continue;
            };

            let ids: Vec<WagerId> = wagers.iter().map(|w| w.id).collect();
            match self.settle_zone(zone, wagers, now, &mut tx).await {
                Ok(outcome) => {
                    totals.lost += outcome.lost;
                    totals.won += outcome.won;
                    totals.paid += outcome.paid;
                    report.changed += outcome.changed();
                    settled.extend(ids);
                }
                Err(e) => {
                    tracing::warn!(zone_id = %zone_id, ticker = %zone.ticker, error = %e, "Settlement skipped zone");
                    report.skipped += 1;
                }
            }
        }

        if shutdown.is_triggered() {
            self.store.rollback(tx);
            return Ok(PassReport::cancelled(report.processed));
        }

        // Finished and won on an earlier pass but never paid
        for mut wager in self.store.get_wagers_awaiting_payout().await? {
            if settled.contains(&wager.id) {
                continue;
            }
            pay(&mut tx, &mut wager);
            totals.paid += 1;
            report.changed += 1;
            tx.update_wager(wager);
        }

        self.store
            .commit(tx)
            .await
            .context("settlement commit failed, pass rolled back")?;

        incr_counter(CounterMetric::WagersLost, totals.lost as u64);
        incr_counter(CounterMetric::WagersWon, totals.won as u64);
        incr_counter(CounterMetric::WagersPaid, totals.paid as u64);
        Ok(report)
    }
}
