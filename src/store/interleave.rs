//! Store wrapper that lands a competing commit in the middle of a pass

use super::{CommitSummary, MarketStore, MemoryStore, StoreError, Transaction};
use crate::market::{Asset, Candle, Currency, Wager, Zone, ZoneId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Read that releases the pending commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hook {
    Candles,
    WagerVolume,
}

/// Delegates to a [`MemoryStore`], committing `pending` to it right after
/// the first read of kind `hook`
pub(crate) struct InterleavedStore {
    inner: MemoryStore,
    hook: Hook,
    pending: Mutex<Option<Transaction>>,
}

impl InterleavedStore {
    pub(crate) fn new(inner: MemoryStore, hook: Hook, pending: Transaction) -> Self {
        Self {
            inner,
            hook,
            pending: Mutex::new(Some(pending)),
        }
    }

    async fn fire(&self, read: Hook) {
        if read != self.hook {
            return;
        }
        let pending = self.pending.lock().unwrap().take();
        if let Some(tx) = pending {
            self.inner.commit(tx).await.unwrap();
        }
    }
}

#[async_trait]
impl MarketStore for InterleavedStore {
    async fn get_candles(
        &self,
        asset_id: &str,
        interval: &str,
        count: usize,
    ) -> Result<Vec<Candle>, StoreError> {
        let candles = self.inner.get_candles(asset_id, interval, count).await;
        self.fire(Hook::Candles).await;
        candles
    }

    async fn get_candles_between(
        &self,
        asset_id: &str,
        interval: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candle>, StoreError> {
        self.inner.get_candles_between(asset_id, interval, from, to).await
    }

    async fn get_latest_candle(
        &self,
        asset_id: &str,
        interval: &str,
    ) -> Result<Option<Candle>, StoreError> {
        self.inner.get_latest_candle(asset_id, interval).await
    }

    async fn get_all_assets(&self) -> Result<Vec<Asset>, StoreError> {
        self.inner.get_all_assets().await
    }

    async fn get_active_zones(
        &self,
        ticker: &str,
        timeframe_hours: u32,
    ) -> Result<Vec<Zone>, StoreError> {
        self.inner.get_active_zones(ticker, timeframe_hours).await
    }

    async fn get_all_active_zones(&self) -> Result<Vec<Zone>, StoreError> {
        self.inner.get_all_active_zones().await
    }

    async fn get_zones(&self, ids: &[ZoneId]) -> Result<Vec<Zone>, StoreError> {
        self.inner.get_zones(ids).await
    }

    async fn get_wager_volume_by_zone(
        &self,
        zone_ids: &[ZoneId],
    ) -> Result<HashMap<ZoneId, Decimal>, StoreError> {
        let volumes = self.inner.get_wager_volume_by_zone(zone_ids).await;
        self.fire(Hook::WagerVolume).await;
        volumes
    }

    async fn get_active_wagers(
        &self,
        zone_ids: &[ZoneId],
        unfinished_only: bool,
    ) -> Result<Vec<Wager>, StoreError> {
        self.inner.get_active_wagers(zone_ids, unfinished_only).await
    }

    async fn get_unfinished_wagers(&self) -> Result<Vec<Wager>, StoreError> {
        self.inner.get_unfinished_wagers().await
    }

    async fn get_wagers_awaiting_payout(&self) -> Result<Vec<Wager>, StoreError> {
        self.inner.get_wagers_awaiting_payout().await
    }

    async fn get_fx_rate(&self, pair: &str) -> Result<Option<Decimal>, StoreError> {
        self.inner.get_fx_rate(pair).await
    }

    async fn get_balance(&self, user_id: Uuid, currency: Currency) -> Result<Decimal, StoreError> {
        self.inner.get_balance(user_id, currency).await
    }

    async fn commit(&self, tx: Transaction) -> Result<CommitSummary, StoreError> {
        self.inner.commit(tx).await
    }
}
