//! Windowed maximum price variation

use crate::market::{to_f64, Candle};

/// Upper bound on the reported variation, in percent
const MAX_VARIATION_PCT: f64 = 20.0;
/// Recency bias of the weighted average range
const RECENCY_BASE: f64 = 1.1;

/// Largest plausible move over the window, in percent of price
///
/// The maximum of the largest single-candle range (fraction of its close),
/// the full-window high-low range (fraction of `current_price`), and a
/// recency-weighted mean candle range plus one weighted standard deviation.
/// Capped at 20%.
pub fn max_variation_for_horizon(candles: &[Candle], current_price: f64) -> f64 {
    if candles.is_empty() || current_price <= 0.0 {
        return 0.0;
    }

    let mut max_single = 0.0f64;
    let mut window_high = f64::MIN;
    let mut window_low = f64::MAX;
    let mut ranges = Vec::with_capacity(candles.len());

    for candle in candles {
        let high = to_f64(candle.high);
        let low = to_f64(candle.low);
        let close = to_f64(candle.close);
        window_high = window_high.max(high);
        window_low = window_low.min(low);
        if close > 0.0 {
            let range = (high - low) / close;
            max_single = max_single.max(range);
            ranges.push(range);
        }
    }

    let window_range = (window_high - window_low) / current_price;

    // Oldest candle gets weight 1, each newer one 1.1x the previous
    let mut weight_sum = 0.0;
    let mut weighted = 0.0;
    for (age, range) in ranges.iter().enumerate() {
        let w = RECENCY_BASE.powi(age as i32);
        weighted += w * range;
        weight_sum += w;
    }
    let weighted_band = if weight_sum > 0.0 {
        let mean = weighted / weight_sum;
        let variance = ranges
            .iter()
            .enumerate()
            .map(|(age, r)| RECENCY_BASE.powi(age as i32) * (r - mean).powi(2))
            .sum::<f64>()
            / weight_sum;
        mean + variance.sqrt()
    } else {
        0.0
    };

    let pct = max_single.max(window_range).max(weighted_band) * 100.0;
    if pct.is_finite() {
        pct.min(MAX_VARIATION_PCT)
    } else {
        0.0
    }
}
