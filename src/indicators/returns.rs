//! Log returns, EWMA volatility and drift

/// Log returns `ln(p[i] / p[i-1])` over consecutive positive prices
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .map(|w| (w[1] / w[0]).ln())
        .collect()
}

/// Exponentially weighted volatility of a return series
///
/// Weight `lambda^(n-1-i)` puts the most weight on the last return. The
/// weighted mean square is normalized by the sum of weights, then rooted.
/// Returns 0 for fewer than 2 returns.
pub fn ewma_volatility(returns: &[f64], lambda: f64) -> f64 {
    let n = returns.len();
    if n < 2 {
        return 0.0;
    }

    let mut weighted = 0.0;
    let mut weight_sum = 0.0;
    for (i, r) in returns.iter().enumerate() {
        let w = lambda.powi((n - 1 - i) as i32);
        weighted += w * r * r;
        weight_sum += w;
    }

    if weight_sum <= 0.0 {
        return 0.0;
    }
    (weighted / weight_sum).sqrt()
}

/// Mean return per time step, not annualized
pub fn drift(returns: &[f64], time_step: f64) -> f64 {
    if returns.is_empty() || time_step <= 0.0 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    mean / time_step
}
