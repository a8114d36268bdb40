//! Price zones users wager on

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Zone identifier
pub type ZoneId = Uuid;

/// How a zone's target price was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    /// Raw offset below current price
    Below,
    /// "Stay near current price"
    Current,
    /// Raw offset above current price
    Above,
    /// Snapped to a detected support level
    Support,
    /// Snapped to a detected resistance level
    Resistance,
    /// Snapped to a Bollinger band
    Bollinger,
}

/// Currency ledger a zone is priced in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Quote currency of the asset
    Usd,
    /// Secondary ledger, scaled by the live EUR rate
    Eur,
}

/// A persisted zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub ticker: String,
    pub target_price: Decimal,
    /// Full band width in percent of the target price
    pub margin_percent: Decimal,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub target_odds: Decimal,
    pub kind: ZoneKind,
    pub timeframe_hours: u32,
    pub active: bool,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
}

impl Zone {
    /// Upper settlement bound: `target + target * margin / 200`
    pub fn upper_bound(&self) -> Decimal {
        self.target_price + self.target_price * self.margin_percent / dec!(200)
    }

    /// Lower settlement bound: `target - target * margin / 200`
    pub fn lower_bound(&self) -> Decimal {
        self.target_price - self.target_price * self.margin_percent / dec!(200)
    }

    /// Whether `now` falls inside `[start, end]`
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now <= self.end_time
    }

    /// Whether the zone window has begun
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now
    }

    /// Sign of the zone relative to `price`: +1 wholly above, -1 wholly below, 0 straddling
    pub fn direction(&self, price: Decimal) -> i8 {
        if self.lower_bound() > price {
            1
        } else if self.upper_bound() < price {
            -1
        } else {
            0
        }
    }
}
