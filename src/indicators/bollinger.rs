//! Bollinger bands

use serde::{Deserialize, Serialize};

/// Simple moving average with upper/lower bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// SMA +/- `k` population standard deviations over the last `period` closes
///
/// Uses the whole series when it is shorter than `period`. Returns `None`
/// for an empty series.
pub fn bollinger_bands(closes: &[f64], period: usize, k: f64) -> Option<BollingerBands> {
    if closes.is_empty() || period == 0 {
        return None;
    }

    let window = &closes[closes.len().saturating_sub(period)..];
    let n = window.len() as f64;
    let middle = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|c| (c - middle).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    Some(BollingerBands {
        upper: middle + k * std_dev,
        middle,
        lower: middle - k * std_dev,
    })
}
