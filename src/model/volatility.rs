//! Volatility estimation
//!
//! EWMA volatility of log returns, falling back to the sample standard
//! deviation of closes when the EWMA figure is unusable

use crate::indicators::{ewma_volatility, log_returns};

/// Which estimator produced the volatility figure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilitySource {
    /// Exponentially weighted log-return volatility
    Ewma,
    /// Sample standard deviation of closes relative to their mean
    SampleStdDev,
}

/// Per-candle volatility estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityEstimate {
    pub value: f64,
    pub source: VolatilitySource,
}

/// Estimate per-candle volatility from a close series
///
/// Returns `None` when neither estimator yields a finite positive value.
pub fn estimate_volatility(closes: &[f64], lambda: f64) -> Option<VolatilityEstimate> {
    let returns = log_returns(closes);
    let ewma = ewma_volatility(&returns, lambda);
    if ewma.is_finite() && ewma > 0.0 {
        return Some(VolatilityEstimate {
            value: ewma,
            source: VolatilitySource::Ewma,
        });
    }

    let fallback = sample_std_ratio(closes)?;
    tracing::debug!(ewma, fallback, "EWMA volatility unusable, using sample std dev");
    Some(VolatilityEstimate {
        value: fallback,
        source: VolatilitySource::SampleStdDev,
    })
}

/// Sample standard deviation of closes divided by their mean
fn sample_std_ratio(closes: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = closes
        .iter()
        .copied()
        .filter(|c| c.is_finite() && *c > 0.0)
        .collect();
    if finite.len() < 2 {
        return None;
    }

    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let variance = finite.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let ratio = variance.sqrt() / mean;

    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}
