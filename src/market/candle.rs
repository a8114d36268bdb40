//! OHLC candle snapshots

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upsert key of a candle
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandleKey {
    pub asset_id: String,
    pub exchange: String,
    pub interval: String,
    pub timestamp: DateTime<Utc>,
}

/// A single OHLC bar, immutable once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Asset ticker (e.g. "AAPL", "BTC/USD")
    pub asset_id: String,
    /// Exchange or venue the bar came from
    pub exchange: String,
    /// Bar interval (e.g. "1h")
    pub interval: String,
    /// Bar open time in UTC
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Candle {
    /// Key used to upsert this candle
    pub fn key(&self) -> CandleKey {
        CandleKey {
            asset_id: self.asset_id.clone(),
            exchange: self.exchange.clone(),
            interval: self.interval.clone(),
            timestamp: self.timestamp,
        }
    }

    /// High minus low
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }
}
