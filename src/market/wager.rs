//! User wagers on zones

use super::{Currency, ZoneId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wager identifier
pub type WagerId = Uuid;

/// Outcome status as recorded by settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagerStatus {
    /// Price has stayed inside the zone so far
    Active,
    /// Price left the zone during its window
    Lost,
    /// Window elapsed without a breach
    Won,
}

/// Lifecycle view: `Active -> {Lost | Won} -> Finished -> Paid`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WagerState {
    Active,
    Lost,
    Won,
    Finished,
    Paid,
}

/// A wager placed by the (external) placement flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wager {
    pub id: WagerId,
    pub user_id: Uuid,
    pub ticker: String,
    /// Stake
    pub amount: Decimal,
    /// Asset price when the wager was placed
    pub origin_value: Decimal,
    /// Zone odds snapshot at placement
    pub origin_odds: Decimal,
    pub zone_id: ZoneId,
    pub currency: Currency,
    pub status: WagerStatus,
    /// Set once the zone window (plus grace) has elapsed
    pub finished: bool,
    /// Set once the payout has been credited
    pub paid: bool,
    pub archived: bool,
    pub placed_at: DateTime<Utc>,
}

impl Wager {
    /// Create an active wager
    pub fn new(
        user_id: Uuid,
        ticker: impl Into<String>,
        zone_id: ZoneId,
        currency: Currency,
        amount: Decimal,
        origin_value: Decimal,
        origin_odds: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            ticker: ticker.into(),
            amount,
            origin_value,
            origin_odds,
            zone_id,
            currency,
            status: WagerStatus::Active,
            finished: false,
            paid: false,
            archived: false,
            placed_at: Utc::now(),
        }
    }

    /// Collapse the stored flags into a single lifecycle state
    pub fn state(&self) -> WagerState {
        if self.paid {
            WagerState::Paid
        } else if self.finished && self.status != WagerStatus::Won {
            WagerState::Finished
        } else {
            match self.status {
                WagerStatus::Active => WagerState::Active,
                WagerStatus::Lost => WagerState::Lost,
                WagerStatus::Won => WagerState::Won,
            }
        }
    }

    /// Payout owed on a won wager
    pub fn payout(&self) -> Decimal {
        self.amount * self.origin_odds
    }

    /// Finished, won and not yet paid
    pub fn awaiting_payout(&self) -> bool {
        self.finished && self.status == WagerStatus::Won && !self.paid
    }
}
