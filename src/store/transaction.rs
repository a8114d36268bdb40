//! Buffered unit of work

use crate::market::{Asset, Candle, Currency, Wager, Zone, ZoneId};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A single buffered write
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    UpsertCandles(Vec<Candle>),
    /// Set an asset's current price, leaving the rest of the record alone
    SetAssetPrice { ticker: String, price: Decimal },
    /// Set an asset's max-odd cache, leaving the rest of the record alone
    SetMaxOdd {
        ticker: String,
        max_odd: Option<Decimal>,
        direction: Option<i8>,
    },
    AddZone(Zone),
    /// Deactivate all active zones of a ticker
    DeactivateZones { ticker: String },
    /// Re-price a zone; ignored once the zone is inactive
    SetZoneOdds { id: ZoneId, odds: Decimal },
    InsertWager(Wager),
    UpdateWager(Wager),
    /// Add `amount` to a user's balance in `currency`
    CreditBalance {
        user_id: Uuid,
        currency: Currency,
        amount: Decimal,
    },
    SetFxRate { pair: String, rate: Decimal },
}

/// Outcome of a successful commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Writes applied
    pub writes: usize,
    /// Zones switched from active to inactive
    pub deactivated: usize,
}

/// Writes collected during a pass, applied in order on commit
///
/// Dropping a transaction without committing it discards its writes.
#[derive(Debug, Default)]
pub struct Transaction {
    writes: Vec<Write>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_candles(&mut self, candles: Vec<Candle>) {
        if !candles.is_empty() {
            self.writes.push(Write::UpsertCandles(candles));
        }
    }

    pub fn set_asset_price(&mut self, ticker: &str, price: Decimal) {
        self.writes.push(Write::SetAssetPrice {
            ticker: ticker.to_string(),
            price,
        });
    }

    /// Persist the max-odd cache currently held by `asset`
    pub fn set_max_odd(&mut self, asset: &Asset) {
        self.writes.push(Write::SetMaxOdd {
            ticker: asset.ticker.clone(),
            max_odd: asset.max_odd,
            direction: asset.max_odd_direction,
        });
    }

    pub fn add_zone(&mut self, zone: Zone) {
        self.writes.push(Write::AddZone(zone));
    }

    pub fn deactivate_zones(&mut self, ticker: &str) {
        self.writes.push(Write::DeactivateZones {
            ticker: ticker.to_string(),
        });
    }

    pub fn set_zone_odds(&mut self, id: ZoneId, odds: Decimal) {
        self.writes.push(Write::SetZoneOdds { id, odds });
    }

    pub fn insert_wager(&mut self, wager: Wager) {
        self.writes.push(Write::InsertWager(wager));
    }

    pub fn update_wager(&mut self, wager: Wager) {
        self.writes.push(Write::UpdateWager(wager));
    }

    pub fn credit_balance(&mut self, user_id: Uuid, currency: Currency, amount: Decimal) {
        self.writes.push(Write::CreditBalance {
            user_id,
            currency,
            amount,
        });
    }

    pub fn set_fx_rate(&mut self, pair: &str, rate: Decimal) {
        self.writes.push(Write::SetFxRate {
            pair: pair.to_string(),
            rate,
        });
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub(crate) fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}
