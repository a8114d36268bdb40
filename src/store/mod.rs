//! Persistence contract
//!
//! The zone engine never talks to a database directly. Everything it reads
//! or writes goes through [`MarketStore`]; writes made during a pass are
//! buffered in a [`Transaction`] and applied atomically on commit.

#[cfg(test)]
pub(crate) mod interleave;
mod memory;
mod transaction;

pub use memory::MemoryStore;
pub use transaction::{CommitSummary, Transaction, Write};

use crate::market::{Asset, Candle, Currency, Wager, Zone, ZoneId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write referenced a record that does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    /// The transaction could not be applied; nothing was written
    #[error("Commit failed: {0}")]
    CommitFailed(String),
    /// Backend could not serve the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Data operations the engine consumes from its persistence collaborator
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Latest `count` candles, oldest first
    async fn get_candles(
        &self,
        asset_id: &str,
        interval: &str,
        count: usize,
    ) -> Result<Vec<Candle>, StoreError>;

    /// Candles opened in `[from, to)`, oldest first
    async fn get_candles_between(
        &self,
        asset_id: &str,
        interval: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candle>, StoreError>;

    async fn get_latest_candle(
        &self,
        asset_id: &str,
        interval: &str,
    ) -> Result<Option<Candle>, StoreError>;

    async fn get_all_assets(&self) -> Result<Vec<Asset>, StoreError>;

    /// Active zones of one ticker and timeframe
    async fn get_active_zones(
        &self,
        ticker: &str,
        timeframe_hours: u32,
    ) -> Result<Vec<Zone>, StoreError>;

    async fn get_all_active_zones(&self) -> Result<Vec<Zone>, StoreError>;

    /// Zones by id, active or not. Unknown ids are ignored.
    async fn get_zones(&self, ids: &[ZoneId]) -> Result<Vec<Zone>, StoreError>;

    /// Total wagered amount per zone. Zones without wagers are absent.
    async fn get_wager_volume_by_zone(
        &self,
        zone_ids: &[ZoneId],
    ) -> Result<HashMap<ZoneId, Decimal>, StoreError>;

    /// Non-archived wagers on the given zones
    async fn get_active_wagers(
        &self,
        zone_ids: &[ZoneId],
        unfinished_only: bool,
    ) -> Result<Vec<Wager>, StoreError>;

    /// Every non-archived wager whose zone has not been finished yet
    async fn get_unfinished_wagers(&self) -> Result<Vec<Wager>, StoreError>;

    /// Finished, won and unpaid wagers
    async fn get_wagers_awaiting_payout(&self) -> Result<Vec<Wager>, StoreError>;

    /// Last stored rate for a pair such as "EUR/USD"
    async fn get_fx_rate(&self, pair: &str) -> Result<Option<Decimal>, StoreError>;

    async fn get_balance(&self, user_id: Uuid, currency: Currency) -> Result<Decimal, StoreError>;

    /// Start buffering writes
    fn begin_transaction(&self) -> Transaction {
        Transaction::new()
    }

    /// Apply every buffered write or none of them
    async fn commit(&self, tx: Transaction) -> Result<CommitSummary, StoreError>;

    /// Discard buffered writes
    fn rollback(&self, tx: Transaction) {
        if !tx.is_empty() {
            tracing::debug!(discarded = tx.len(), "Transaction rolled back");
        }
    }

    async fn add_zone(&self, zone: Zone) -> Result<(), StoreError> {
        let mut tx = self.begin_transaction();
        tx.add_zone(zone);
        self.commit(tx).await.map(|_| ())
    }

    async fn set_zone_odds(&self, id: ZoneId, odds: Decimal) -> Result<(), StoreError> {
        let mut tx = self.begin_transaction();
        tx.set_zone_odds(id, odds);
        self.commit(tx).await.map(|_| ())
    }

    /// Deactivate every active zone of `ticker`, returning how many changed
    async fn deactivate_zones(&self, ticker: &str) -> Result<usize, StoreError> {
        let mut tx = self.begin_transaction();
        tx.deactivate_zones(ticker);
        self.commit(tx).await.map(|summary| summary.deactivated)
    }

    async fn set_asset_price(&self, ticker: &str, price: Decimal) -> Result<(), StoreError> {
        let mut tx = self.begin_transaction();
        tx.set_asset_price(ticker, price);
        self.commit(tx).await.map(|_| ())
    }

    async fn insert_wager(&self, wager: Wager) -> Result<(), StoreError> {
        let mut tx = self.begin_transaction();
        tx.insert_wager(wager);
        self.commit(tx).await.map(|_| ())
    }

    async fn update_wager(&self, wager: Wager) -> Result<(), StoreError> {
        let mut tx = self.begin_transaction();
        tx.update_wager(wager);
        self.commit(tx).await.map(|_| ())
    }

    async fn upsert_candles(&self, candles: Vec<Candle>) -> Result<(), StoreError> {
        let mut tx = self.begin_transaction();
        tx.upsert_candles(candles);
        self.commit(tx).await.map(|_| ())
    }
}
