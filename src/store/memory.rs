//! In-memory store
//!
//! Backs the `run` command and the tests. A commit applies its writes to a
//! copy of the state and swaps it in only when every write succeeded.

use super::{CommitSummary, MarketStore, StoreError, Transaction, Write};
use crate::market::{Asset, Candle, CandleKey, Currency, Wager, WagerId, Zone, ZoneId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct State {
    candles: BTreeMap<CandleKey, Candle>,
    assets: BTreeMap<String, Asset>,
    zones: HashMap<ZoneId, Zone>,
    wagers: HashMap<WagerId, Wager>,
    balances: HashMap<(Uuid, Currency), Decimal>,
    fx_rates: HashMap<String, Decimal>,
}

impl State {
    /// Apply one write, returning the number of zones it deactivated
    fn apply(&mut self, write: Write) -> Result<usize, StoreError> {
        match write {
            Write::UpsertCandles(candles) => {
                for candle in candles {
                    self.candles.insert(candle.key(), candle);
                }
            }
            Write::SetAssetPrice { ticker, price } => {
                let asset = self
                    .assets
                    .get_mut(&ticker)
                    .ok_or_else(|| not_found("asset", &ticker))?;
                asset.current_price = price;
            }
            Write::SetMaxOdd {
                ticker,
                max_odd,
                direction,
            } => {
                let asset = self
                    .assets
                    .get_mut(&ticker)
                    .ok_or_else(|| not_found("asset", &ticker))?;
                asset.max_odd = max_odd;
                asset.max_odd_direction = direction;
            }
            Write::AddZone(zone) => {
                self.zones.insert(zone.id, zone);
            }
            Write::DeactivateZones { ticker } => {
                let mut count = 0;
                for zone in self.zones.values_mut() {
                    if zone.active && zone.ticker == ticker {
                        zone.active = false;
                        count += 1;
                    }
                }
                return Ok(count);
            }
            Write::SetZoneOdds { id, odds } => {
                let zone = self.zones.get_mut(&id).ok_or_else(|| not_found("zone", &id))?;
                if zone.active {
                    zone.target_odds = odds;
                }
            }
            Write::InsertWager(wager) => {
                if !self.zones.contains_key(&wager.zone_id) {
                    return Err(not_found("zone", &wager.zone_id));
                }
                self.wagers.insert(wager.id, wager);
            }
            Write::UpdateWager(wager) => {
                let slot = self
                    .wagers
                    .get_mut(&wager.id)
                    .ok_or_else(|| not_found("wager", &wager.id))?;
                *slot = wager;
            }
            Write::CreditBalance {
                user_id,
                currency,
                amount,
            } => {
                *self.balances.entry((user_id, currency)).or_default() += amount;
            }
            Write::SetFxRate { pair, rate } => {
                self.fx_rates.insert(pair, rate);
            }
        }
        Ok(0)
    }

    fn candles_for<'a>(
        &'a self,
        asset_id: &'a str,
        interval: &'a str,
    ) -> impl Iterator<Item = &'a Candle> + 'a {
        self.candles
            .values()
            .filter(move |c| c.asset_id == asset_id && c.interval == interval)
    }
}

fn not_found(entity: &'static str, id: &impl ToString) -> StoreError {
    StoreError::NotFound {
        entity,
        id: id.to_string(),
    }
}

fn sorted_by_time(mut candles: Vec<Candle>) -> Vec<Candle> {
    candles.sort_by_key(|c| c.timestamp);
    candles
}

fn sorted_zones(mut zones: Vec<Zone>) -> Vec<Zone> {
    zones.sort_by(|a, b| {
        (&a.ticker, a.timeframe_hours, a.start_time, a.target_price)
            .cmp(&(&b.ticker, b.timeframe_hours, b.start_time, b.target_price))
    });
    zones
}

/// Store holding everything behind a single `RwLock`
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
    fail_commits: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `assets`
    pub fn with_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        let state = State {
            assets: assets
                .into_iter()
                .map(|a| (a.ticker.clone(), a))
                .collect(),
            ..State::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            fail_commits: Arc::default(),
        }
    }

    /// Register or replace an asset
    pub async fn insert_asset(&self, asset: Asset) {
        let mut state = self.state.write().await;
        state.assets.insert(asset.ticker.clone(), asset);
    }

    /// Make every following commit fail, simulating a persistence outage
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Wager by id
    pub async fn wager(&self, id: WagerId) -> Option<Wager> {
        self.state.read().await.wagers.get(&id).cloned()
    }

    /// Zones of a ticker, active or not
    pub async fn zones_for(&self, ticker: &str) -> Vec<Zone> {
        let state = self.state.read().await;
        sorted_zones(
            state
                .zones
                .values()
                .filter(|z| z.ticker == ticker)
                .cloned()
                .collect(),
        )
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn get_candles(
        &self,
        asset_id: &str,
        interval: &str,
        count: usize,
    ) -> Result<Vec<Candle>, StoreError> {
        let state = self.state.read().await;
        let candles = sorted_by_time(state.candles_for(asset_id, interval).cloned().collect());
        let skip = candles.len().saturating_sub(count);
        Ok(candles.into_iter().skip(skip).collect())
    }

    async fn get_candles_between(
        &self,
        asset_id: &str,
        interval: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candle>, StoreError> {
        let state = self.state.read().await;
        Ok(sorted_by_time(
            state
                .candles_for(asset_id, interval)
                .filter(|c| c.timestamp >= from && c.timestamp < to)
                .cloned()
                .collect(),
        ))
    }

    async fn get_latest_candle(
        &self,
        asset_id: &str,
        interval: &str,
    ) -> Result<Option<Candle>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .candles_for(asset_id, interval)
            .max_by_key(|c| c.timestamp)
            .cloned())
    }

    async fn get_all_assets(&self) -> Result<Vec<Asset>, StoreError> {
        let state = self.state.read().await;
        Ok(state.assets.values().cloned().collect())
    }

    async fn get_active_zones(
        &self,
        ticker: &str,
        timeframe_hours: u32,
    ) -> Result<Vec<Zone>, StoreError> {
        let state = self.state.read().await;
        Ok(sorted_zones(
            state
                .zones
                .values()
                .filter(|z| z.active && z.ticker == ticker && z.timeframe_hours == timeframe_hours)
                .cloned()
                .collect(),
        ))
    }

    async fn get_all_active_zones(&self) -> Result<Vec<Zone>, StoreError> {
        let state = self.state.read().await;
        Ok(sorted_zones(
            state.zones.values().filter(|z| z.active).cloned().collect(),
        ))
    }

    async fn get_zones(&self, ids: &[ZoneId]) -> Result<Vec<Zone>, StoreError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.zones.get(id))
            .cloned()
            .collect())
    }

    async fn get_wager_volume_by_zone(
        &self,
        zone_ids: &[ZoneId],
    ) -> Result<HashMap<ZoneId, Decimal>, StoreError> {
        let wanted: HashSet<&ZoneId> = zone_ids.iter().collect();
        let state = self.state.read().await;
        let mut volumes: HashMap<ZoneId, Decimal> = HashMap::new();
        for wager in state.wagers.values() {
            if !wager.archived && wanted.contains(&wager.zone_id) {
                *volumes.entry(wager.zone_id).or_default() += wager.amount;
            }
        }
        Ok(volumes)
    }

    async fn get_active_wagers(
        &self,
        zone_ids: &[ZoneId],
        unfinished_only: bool,
    ) -> Result<Vec<Wager>, StoreError> {
        let wanted: HashSet<&ZoneId> = zone_ids.iter().collect();
        let state = self.state.read().await;
        Ok(state
            .wagers
            .values()
            .filter(|w| !w.archived && wanted.contains(&w.zone_id))
            .filter(|w| !unfinished_only || !w.finished)
            .cloned()
            .collect())
    }

    async fn get_unfinished_wagers(&self) -> Result<Vec<Wager>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .wagers
            .values()
            .filter(|w| !w.archived && !w.finished)
            .cloned()
            .collect())
    }

    async fn get_wagers_awaiting_payout(&self) -> Result<Vec<Wager>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .wagers
            .values()
            .filter(|w| !w.archived && w.awaiting_payout())
            .cloned()
            .collect())
    }

    async fn get_fx_rate(&self, pair: &str) -> Result<Option<Decimal>, StoreError> {
        Ok(self.state.read().await.fx_rates.get(pair).copied())
    }

    async fn get_balance(&self, user_id: Uuid, currency: Currency) -> Result<Decimal, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .balances
            .get(&(user_id, currency))
            .copied()
            .unwrap_or_default())
    }

    async fn commit(&self, tx: Transaction) -> Result<CommitSummary, StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::CommitFailed("store unavailable".to_string()));
        }

        let mut state = self.state.write().await;
        let mut next = state.clone();
        let mut summary = CommitSummary::default();
        for write in tx.into_writes() {
            summary.deactivated += next
                .apply(write)
                .map_err(|e| StoreError::CommitFailed(e.to_string()))?;
            summary.writes += 1;
        }
        *state = next;
        Ok(summary)
    }
}
