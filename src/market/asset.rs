//! Tradable instruments

use super::{Currency, Zone};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Instrument group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetGroup {
    Shares,
    Etf,
    Crypto,
    Forex,
}

/// A tradable asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Ticker symbol, also used as the candle asset id
    pub ticker: String,
    /// Instrument group
    pub group: AssetGroup,
    /// Current price in the quote currency
    pub current_price: Decimal,
    /// Cached best available odd across the asset's active zones
    #[serde(default)]
    pub max_odd: Option<Decimal>,
    /// +1 when the max-odd zone sits above price, -1 below, 0 straddling
    #[serde(default)]
    pub max_odd_direction: Option<i8>,
}

impl Asset {
    /// Create an asset without a cached max odd
    pub fn new(ticker: impl Into<String>, group: AssetGroup, current_price: Decimal) -> Self {
        Self {
            ticker: ticker.into(),
            group,
            current_price,
            max_odd: None,
            max_odd_direction: None,
        }
    }

    /// Recompute the max-odd cache from `zones`, returning whether it changed
    ///
    /// Only active quote-currency zones of the shortest timeframe present
    /// are considered.
    pub fn refresh_max_odd(&mut self, zones: &[Zone]) -> bool {
        let candidates = || {
            zones
                .iter()
                .filter(|z| z.active && z.currency == Currency::Usd && z.ticker == self.ticker)
        };
        let shortest = candidates().map(|z| z.timeframe_hours).min();
        let best = shortest.and_then(|hours| {
            candidates()
                .filter(|z| z.timeframe_hours == hours)
                .max_by(|a, b| a.target_odds.cmp(&b.target_odds))
        });

        let max_odd = best.map(|z| z.target_odds);
        let direction = best.map(|z| z.direction(self.current_price));
        let changed = max_odd != self.max_odd || direction != self.max_odd_direction;
        self.max_odd = max_odd;
        self.max_odd_direction = direction;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::ZoneKind;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn zone(target: Decimal, odds: Decimal, hours: u32, currency: Currency) -> Zone {
        let now = Utc::now();
        Zone {
            id: Uuid::new_v4(),
            ticker: "AAPL".to_string(),
            target_price: target,
            margin_percent: dec!(2),
            start_time: now,
            end_time: now + Duration::hours(i64::from(hours)),
            target_odds: odds,
            kind: ZoneKind::Above,
            timeframe_hours: hours,
            active: true,
            currency,
            created_at: now,
        }
    }

    #[test]
    fn test_refresh_max_odd_uses_shortest_timeframe() {
        let mut asset = Asset::new("AAPL", AssetGroup::Shares, dec!(100));
        let zones = vec![
            zone(dec!(100), dec!(1.2), 1, Currency::Usd),
            zone(dec!(95), dec!(3.5), 1, Currency::Usd),
            zone(dec!(110), dec!(9.0), 4, Currency::Usd),
            zone(dec!(90), dec!(12.0), 1, Currency::Eur),
        ];

        assert!(asset.refresh_max_odd(&zones));
        assert_eq!(asset.max_odd, Some(dec!(3.5)));
        assert_eq!(asset.max_odd_direction, Some(-1));
        assert!(!asset.refresh_max_odd(&zones));
    }

    #[test]
    fn test_refresh_max_odd_clears_without_zones() {
        let mut asset = Asset::new("AAPL", AssetGroup::Shares, dec!(100));
        asset.max_odd = Some(dec!(2));
        asset.max_odd_direction = Some(0);
        assert!(asset.refresh_max_odd(&[]));
        assert_eq!(asset.max_odd, None);
        assert_eq!(asset.max_odd_direction, None);
    }
}
