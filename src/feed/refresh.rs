//! Candle refresh pass
//!
//! Pulls the latest candles for every asset, refreshes asset prices from
//! the last close and stores the EUR rate used by the secondary ledger.

use super::{FeedError, KeyRotation, MarketDataFeed, RotationStep};
use crate::config::FeedConfig;
use crate::scheduler::{Job, PassReport, Shutdown};
use crate::store::MarketStore;
use crate::telemetry::{incr_counter, set_gauge, CounterMetric, GaugeMetric, LatencyMetric};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Scheduled job refreshing candles, prices and the FX rate
pub struct CandleRefreshJob {
    store: Arc<dyn MarketStore>,
    feed: Arc<dyn MarketDataFeed>,
    config: FeedConfig,
    interval: String,
}

impl CandleRefreshJob {
    pub const NAME: &'static str = "candle_refresh";

    /// `interval` is the candle interval requested from the feed
    pub fn new(
        store: Arc<dyn MarketStore>,
        feed: Arc<dyn MarketDataFeed>,
        config: FeedConfig,
        interval: impl Into<String>,
    ) -> Self {
        Self {
            store,
            feed,
            config,
            interval: interval.into(),
        }
    }

    fn key(&self, rotation: KeyRotation) -> &str {
        &self.config.api_keys[rotation.index() % self.config.api_keys.len()]
    }

    /// Sleep out the cooldown owed after the rotation wrapped
    ///
    /// Returns `false` if shutdown arrived during the cooldown.
    async fn cool_down(&self, step: RotationStep, shutdown: &Shutdown) -> bool {
        if step != RotationStep::Wrapped || self.config.cooldown_secs == 0 {
            return true;
        }
        incr_counter(CounterMetric::FeedCooldowns, 1);
        tracing::info!(secs = self.config.cooldown_secs, "API keys exhausted, cooling down");
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(self.config.cooldown_secs)) => true,
            _ = shutdown.wait() => false,
        }
    }
}

#[async_trait]
impl Job for CandleRefreshJob {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn latency_metric(&self) -> LatencyMetric {
        LatencyMetric::RefreshPass
    }

    async fn run_pass(&self, _now: DateTime<Utc>, shutdown: &Shutdown) -> anyhow::Result<PassReport> {
        if self.config.api_keys.is_empty() {
            return Err(FeedError::NoApiKeys.into());
        }

        let assets = self.store.get_all_assets().await?;
        let mut rotation = KeyRotation::new(self.config.api_keys.len(), self.config.calls_per_key);
        let mut last_step = RotationStep::Continue;
        let mut tx = self.store.begin_transaction();
        let mut report = PassReport::default();

        for asset in assets {
            if shutdown.is_triggered() {
                self.store.rollback(tx);
                return Ok(PassReport::cancelled(report.processed));
            }
            report.processed += 1;

            if !self.cool_down(last_step, shutdown).await {
                self.store.rollback(tx);
                return Ok(PassReport::cancelled(report.processed));
            }
            let fetched = self
                .feed
                .fetch_candles(
                    self.key(rotation),
                    &asset.ticker,
                    &self.interval,
                    self.config.refresh_candles,
                )
                .await;
            (rotation, last_step) = rotation.advance();

            let candles = match fetched {
                Ok(candles) if !candles.is_empty() => candles,
                Ok(_) => {
                    tracing::warn!(ticker = %asset.ticker, "Feed returned no candles, skipping");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(ticker = %asset.ticker, error = %e, "Candle fetch failed, skipping");
                    incr_counter(CounterMetric::AssetsSkipped, 1);
                    report.skipped += 1;
                    continue;
                }
            };

            if let Some(last) = candles.last() {
                tx.set_asset_price(&asset.ticker, last.close);
                tracing::debug!(ticker = %asset.ticker, count = candles.len(), price = %last.close, "Candles refreshed");
            }
            report.changed += candles.len() + 1;
            tx.upsert_candles(candles);
        }

        // The rate request draws on the same key budget
        if !self.cool_down(last_step, shutdown).await {
            self.store.rollback(tx);
            return Ok(PassReport::cancelled(report.processed));
        }
        match self
            .feed
            .fetch_exchange_rate(self.key(rotation), &self.config.quote_fx_pair)
            .await
        {
            Ok(rate) => {
                set_gauge(GaugeMetric::FxRate, crate::market::to_f64(rate));
                tx.set_fx_rate(&self.config.quote_fx_pair, rate);
                report.changed += 1;
            }
            Err(e) => {
                tracing::warn!(pair = %self.config.quote_fx_pair, error = %e, "Exchange rate fetch failed");
            }
        }

        self.store
            .commit(tx)
            .await
            .context("candle refresh commit failed, pass rolled back")?;
        Ok(report)
    }
}
