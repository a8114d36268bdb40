//! Zone generation pass
//!
//! Computes indicators once per asset, generates a zone set for every
//! period of every configured timeframe, and replaces the asset's active
//! zones in both currency ledgers.

use super::{period_windows, PeriodWindow, ZoneCandidate, ZoneError, ZoneGenerator, ZoneInputs};
use crate::config::GenerationConfig;
use crate::indicators::{
    bollinger_bands, drift, log_returns, max_variation_for_horizon, rsi, support_resistance,
};
use crate::market::{to_f64, Asset, Candle, Currency, Zone};
use crate::model::{estimate_volatility, odds_to_decimal, probability_to_odds, ReachModel, HOURS_PER_YEAR};
use crate::scheduler::{Job, PassReport, Shutdown};
use crate::store::MarketStore;
use crate::telemetry::{incr_counter, set_gauge, CounterMetric, GaugeMetric, LatencyMetric};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Zones generated for one (timeframe, period)
#[derive(Debug, Clone)]
pub struct PlannedZoneSet {
    pub timeframe_hours: u32,
    pub window: PeriodWindow,
    /// Sorted by price
    pub zones: Vec<ZoneCandidate>,
}

/// Candles needed before any indicator is meaningful
fn required_candles(config: &GenerationConfig) -> usize {
    (config.rsi_period + 1)
        .max(2 * config.pivot_lookback + 1)
        .max(config.bollinger_period)
        .max(2)
}

/// Plan every zone set of one asset
///
/// `candles` are the asset's recent bars, oldest first. Periods that fail
/// are skipped; the asset fails only when no period produced zones.
pub fn plan_asset_zones<M: ReachModel>(
    config: &GenerationConfig,
    generator: &ZoneGenerator<M>,
    current_price: f64,
    candles: &[Candle],
    now: DateTime<Utc>,
) -> Result<Vec<PlannedZoneSet>, ZoneError> {
    let required = required_candles(config);
    if candles.len() < required {
        return Err(ZoneError::InsufficientData {
            required,
            available: candles.len(),
        });
    }
    if !(current_price.is_finite() && current_price > 0.0) {
        return Err(ZoneError::InvalidNumeric(format!("current price {current_price}")));
    }

    let closes: Vec<f64> = candles.iter().map(|c| to_f64(c.close)).collect();
    let highs: Vec<f64> = candles.iter().map(|c| to_f64(c.high)).collect();
    let lows: Vec<f64> = candles.iter().map(|c| to_f64(c.low)).collect();

    let volatility = estimate_volatility(&closes, config.ewma_lambda)
        .ok_or_else(|| ZoneError::InvalidNumeric("volatility".to_string()))?;
    let rsi_value = rsi(&closes, config.rsi_period);
    let bands = bollinger_bands(&closes, config.bollinger_period, config.bollinger_k);
    let levels = support_resistance(&highs, &lows, &closes, config.pivot_lookback);
    let annual_drift = drift(&log_returns(&closes), 1.0) * HOURS_PER_YEAR;

    let mut sets = Vec::new();
    for timeframe in &config.timeframes {
        let window_len = (timeframe.hours as usize).min(candles.len());
        let variation = max_variation_for_horizon(&candles[candles.len() - window_len..], current_price);

        for window in period_windows(now, timeframe.hours, timeframe.periods) {
            let hours_to_expiry = window.hours_to_expiry(now);
            if hours_to_expiry < config.min_hours_to_expiry {
                tracing::debug!(hours = timeframe.hours, period = window.index, "Window too short, skipping");
                continue;
            }

            let inputs = ZoneInputs {
                current_price,
                levels: &levels,
                bands,
                volatility: volatility.value,
                hours_to_expiry,
                rsi: rsi_value,
                drift: annual_drift,
                zone_count: timeframe.zone_count,
                max_variation_pct: (variation > 0.0).then_some(variation),
            };

            match generator.generate(&inputs) {
                Ok(zones) => sets.push(PlannedZoneSet {
                    timeframe_hours: timeframe.hours,
                    window,
                    zones,
                }),
                Err(e) => {
                    tracing::debug!(hours = timeframe.hours, period = window.index, error = %e, "Period skipped");
                }
            }
        }
    }

    if sets.is_empty() {
        return Err(ZoneError::NoZones);
    }
    Ok(sets)
}

fn to_decimal(value: f64, what: &str) -> Result<Decimal, ZoneError> {
    Decimal::try_from(value).map_err(|_| ZoneError::InvalidNumeric(format!("{what} {value}")))
}

/// Turn planned sets into persistable zones in one currency
///
/// `scale` converts quote-currency prices into `currency`.
fn materialize(
    ticker: &str,
    sets: &[PlannedZoneSet],
    currency: Currency,
    scale: Decimal,
    house_margin: f64,
    now: DateTime<Utc>,
) -> Result<Vec<Zone>, ZoneError> {
    let mut zones = Vec::new();
    for set in sets {
        for candidate in &set.zones {
            let target = to_decimal(candidate.target, "target")?;
            zones.push(Zone {
                id: Uuid::new_v4(),
                ticker: ticker.to_string(),
                target_price: (target * scale).round_dp(6),
                margin_percent: to_decimal(candidate.margin_percent(), "margin")?.round_dp(4),
                start_time: set.window.start,
                end_time: set.window.end,
                target_odds: odds_to_decimal(probability_to_odds(candidate.probability, house_margin)),
                kind: candidate.kind,
                timeframe_hours: set.timeframe_hours,
                active: true,
                currency,
                created_at: now,
            });
        }
    }
    Ok(zones)
}

/// Scheduled job regenerating every asset's zones
pub struct ZoneGenerationJob<M> {
    store: Arc<dyn MarketStore>,
    generator: ZoneGenerator<M>,
    config: GenerationConfig,
    fx_pair: String,
}

impl<M: ReachModel> ZoneGenerationJob<M> {
    /// `fx_pair` names the stored rate used for the EUR ledger
    pub fn new(
        store: Arc<dyn MarketStore>,
        model: M,
        config: GenerationConfig,
        fx_pair: impl Into<String>,
    ) -> Self {
        Self {
            store,
            generator: ZoneGenerator::new(model, config.gap_pct),
            config,
            fx_pair: fx_pair.into(),
        }
    }

    /// Zones for one asset in every available ledger, quote currency first,
    /// with the price they were built from
    ///
    /// Any error means the asset is skipped for this pass.
    async fn build_asset_zones(
        &self,
        asset: &Asset,
        fx_rate: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<(Vec<Zone>, Decimal)> {
        let candles = self
            .store
            .get_candles(&asset.ticker, &self.config.candle_interval, self.config.history_candles)
            .await?;

        let price = if asset.current_price > Decimal::ZERO {
            asset.current_price
        } else {
            candles.last().map(|c| c.close).unwrap_or(Decimal::ZERO)
        };

        let sets = plan_asset_zones(&self.config, &self.generator, to_f64(price), &candles, now)?;
        let margin = self.config.house_margin;
        let mut zones = materialize(&asset.ticker, &sets, Currency::Usd, Decimal::ONE, margin, now)?;
        if let Some(rate) = fx_rate {
            zones.extend(materialize(
                &asset.ticker,
                &sets,
                Currency::Eur,
                Decimal::ONE / rate,
                margin,
                now,
            )?);
        }
        Ok((zones, price))
    }
}

#[async_trait]
impl<M: ReachModel + 'static> Job for ZoneGenerationJob<M> {
    fn name(&self) -> &'static str {
        "zone_generation"
    }

    fn latency_metric(&self) -> LatencyMetric {
        LatencyMetric::GenerationPass
    }

    async fn run_pass(&self, now: DateTime<Utc>, shutdown: &Shutdown) -> anyhow::Result<PassReport> {
        let assets = self.store.get_all_assets().await?;
        let fx_rate = match self.store.get_fx_rate(&self.fx_pair).await {
            Ok(Some(rate)) if rate > Decimal::ZERO => Some(rate),
            Ok(_) => {
                tracing::warn!(pair = %self.fx_pair, "No exchange rate stored, EUR zones skipped this pass");
                None
            }
            Err(e) => {
                tracing::warn!(pair = %self.fx_pair, error = %e, "Exchange rate lookup failed, EUR zones skipped");
                None
            }
        };

        let mut tx = self.store.begin_transaction();
        let mut report = PassReport::default();
        let mut generated = 0usize;

        for mut asset in assets {
            if shutdown.is_triggered() {
                self.store.rollback(tx);
                return Ok(PassReport::cancelled(report.processed));
            }
            report.processed += 1;

            let (zones, price) = match self.build_asset_zones(&asset, fx_rate, now).await {
                Ok(built) => built,
                Err(e) => {
                    tracing::warn!(ticker = %asset.ticker, error = %e, "Zone generation skipped asset");
                    incr_counter(CounterMetric::AssetsSkipped, 1);
                    report.skipped += 1;
                    continue;
                }
            };

            tracing::info!(ticker = %asset.ticker, count = zones.len(), "Zones generated");
            generated += zones.len();

            tx.deactivate_zones(&asset.ticker);
            // Direction is taken against the price the zones were built from
            asset.current_price = price;
            if asset.refresh_max_odd(&zones) {
                tx.set_max_odd(&asset);
            }
            for zone in zones {
                tx.add_zone(zone);
            }
        }

        let summary = self
            .store
            .commit(tx)
            .await
            .context("zone generation commit failed, pass rolled back")?;

        incr_counter(CounterMetric::ZonesGenerated, generated as u64);
        if let Ok(active) = self.store.get_all_active_zones().await {
            set_gauge(GaugeMetric::ActiveZones, active.len() as f64);
        }
        tracing::debug!(deactivated = summary.deactivated, "Superseded previous zones");
        report.changed = generated;
        Ok(report)
    }
}
