//! Geometric Brownian Motion reach model
//!
//! z = (ln(K/S) - mu*t) / (sigma*sqrt(t)) with mu = drift - 0.5*sigma^2.
//! A target above spot is reached with probability 1 - N(z), one below
//! with N(z).

use super::{ReachModel, ReachParams};

/// Hours in a (non-leap) year
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// Probability floor and ceiling
const MIN_PROBABILITY: f64 = 0.01;
const MAX_PROBABILITY: f64 = 0.99;
/// |ln(K/S)| below which a degenerate model treats the target as spot
const AT_SPOT_LOG_DISTANCE: f64 = 0.001;

/// GBM-based reach model
#[derive(Debug, Clone, Copy, Default)]
pub struct GbmReachModel;

impl GbmReachModel {
    /// Create a new GBM reach model
    pub fn new() -> Self {
        Self
    }
}

impl ReachModel for GbmReachModel {
    fn reach_probability(&self, params: ReachParams) -> f64 {
        let ReachParams {
            current_price: s,
            target_price: k,
            volatility,
            hours_to_expiry,
            drift,
        } = params;

        if hours_to_expiry <= 0.0 {
            // At expiry: deterministic outcome
            return if s == k { 1.0 } else { 0.0 };
        }
        if s <= 0.0 || k <= 0.0 {
            return MIN_PROBABILITY;
        }

        let t_years = hours_to_expiry / HOURS_PER_YEAR;
        let sigma = volatility * HOURS_PER_YEAR.sqrt();
        let log_distance = (k / s).ln();

        let scale = sigma * t_years.sqrt();
        if scale == 0.0 || !scale.is_finite() {
            return if log_distance.abs() < AT_SPOT_LOG_DISTANCE {
                0.5
            } else {
                MIN_PROBABILITY
            };
        }

        // Ito-adjusted mean log return
        let mu = drift - 0.5 * sigma * sigma;
        let z = (log_distance - mu * t_years) / scale;

        let below = normal_cdf(z);
        let probability = if k >= s { 1.0 - below } else { below };

        if !probability.is_finite() {
            return MIN_PROBABILITY;
        }
        probability.clamp(MIN_PROBABILITY, MAX_PROBABILITY)
    }
}

/// Standard normal CDF approximation (Abramowitz and Stegun 7.1.26)
pub fn normal_cdf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs() / std::f64::consts::SQRT_2;

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    0.5 * (1.0 + sign * y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(target: f64) -> ReachParams {
        ReachParams {
            current_price: 100.0,
            target_price: target,
            volatility: 0.01,
            hours_to_expiry: 24.0,
            drift: 0.0,
        }
    }

    #[test]
    fn test_at_the_money_near_half() {
        let p = GbmReachModel::new().reach_probability(params(100.0));
        assert!(p > 0.45 && p < 0.55);
    }

    #[test]
    fn test_monotone_moving_away_from_spot() {
        let model = GbmReachModel::new();
        let near_up = model.reach_probability(params(101.0));
        let far_up = model.reach_probability(params(110.0));
        assert!(near_up >= far_up);

        let near_down = model.reach_probability(params(99.0));
        let far_down = model.reach_probability(params(90.0));
        assert!(near_down >= far_down);
    }

    #[test]
    fn test_monotone_grid() {
        let model = GbmReachModel::new();
        let mut last = f64::MAX;
        for step in 0..40 {
            let p = model.reach_probability(params(100.0 * (1.0 + step as f64 * 0.0025)));
            assert!(p <= last + 1e-12);
            last = p;
        }
    }

    #[test]
    fn test_clamped_range() {
        let model = GbmReachModel::new();
        for target in [1.0, 50.0, 99.9, 100.0, 100.1, 200.0, 10_000.0] {
            let p = model.reach_probability(params(target));
            assert!((0.01..=0.99).contains(&p));
        }
    }

    #[test]
    fn test_expired_window() {
        let model = GbmReachModel::new();
        let mut at_spot = params(100.0);
        at_spot.hours_to_expiry = 0.0;
        assert_eq!(model.reach_probability(at_spot), 1.0);

        let mut away = params(101.0);
        away.hours_to_expiry = -1.0;
        assert_eq!(model.reach_probability(away), 0.0);
    }

    #[test]
    fn test_non_positive_prices() {
        let model = GbmReachModel::new();
        let mut p = params(100.0);
        p.current_price = 0.0;
        assert_eq!(model.reach_probability(p), 0.01);
    }

    #[test]
    fn test_zero_volatility_short_circuit() {
        let model = GbmReachModel::new();
        let mut p = params(100.05);
        p.volatility = 0.0;
        assert_eq!(model.reach_probability(p), 0.5);

        let mut p = params(105.0);
        p.volatility = 0.0;
        assert_eq!(model.reach_probability(p), 0.01);

        let mut p = params(105.0);
        p.volatility = f64::NAN;
        assert_eq!(model.reach_probability(p), 0.01);
    }

    #[test]
    fn test_normal_cdf_reference_points() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((normal_cdf(-1.96) - 0.025).abs() < 1e-3);
    }
}
