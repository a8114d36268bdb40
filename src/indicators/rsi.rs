//! Relative strength index

use super::NEUTRAL_RSI;

/// Simple-average RSI over the last `period` deltas
///
/// Returns 50 with fewer than `period + 1` closes and 100 when there were
/// no losses.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let tail = &closes[closes.len() - (period + 1)..];
    let mut gains = 0.0;
    let mut losses = 0.0;
    for w in tail.windows(2) {
        let change = w[1] - w[0];
        if !change.is_finite() {
            continue;
        }
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    if avg_loss == 0.0 {
        return 100.0;
    }

    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}
