//! Probability to decimal odds

use rust_decimal::{Decimal, RoundingStrategy};

/// House edge applied to fair odds
pub const DEFAULT_HOUSE_MARGIN: f64 = 0.95;
/// Lowest odds ever offered
pub const MIN_ODDS: f64 = 1.01;
/// Odds for an impossible outcome
const ZERO_PROBABILITY_ODDS: f64 = 100.0;

/// `max(1.01, round(margin / p, 2))`, with 100 for `p <= 0` and 1.01 for `p >= 1`
pub fn probability_to_odds(probability: f64, margin: f64) -> f64 {
    if probability.is_nan() || probability <= 0.0 {
        return ZERO_PROBABILITY_ODDS;
    }
    if probability >= 1.0 {
        return MIN_ODDS;
    }
    round_odds((1.0 / probability) * margin).max(MIN_ODDS)
}

/// Round to two decimals, half away from zero
pub fn round_odds(odds: f64) -> f64 {
    (odds * 100.0).round() / 100.0
}

/// Convert model odds into a two-decimal `Decimal`
pub(crate) fn odds_to_decimal(odds: f64) -> Decimal {
    Decimal::try_from(odds)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .unwrap_or(Decimal::new(101, 2))
}
