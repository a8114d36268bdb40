//! Zone exit detection

use crate::market::{Candle, Zone};
use rust_decimal::Decimal;

/// First candle whose range leaves the zone, if any
///
/// A candle breaches when `high > upper` or `low < lower`; touching a bound
/// is not a breach. `fx_rate` converts candle prices into the zone's
/// currency as `price / fx_rate` and is 1 for quote-currency zones.
pub fn find_breach<'a>(zone: &Zone, candles: &'a [Candle], fx_rate: Decimal) -> Option<&'a Candle> {
    let upper = zone.upper_bound();
    let lower = zone.lower_bound();
    let rate = if fx_rate > Decimal::ZERO {
        fx_rate
    } else {
        Decimal::ONE
    };

    candles
        .iter()
        .find(|c| c.high / rate > upper || c.low / rate < lower)
}
