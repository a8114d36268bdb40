//! Reach-probability model
//!
//! Prices zones: probability that a GBM price path ends within reach of a
//! target, and the mapping from probability to decimal odds

mod odds;
mod reach;
mod volatility;

pub(crate) use odds::odds_to_decimal;
pub use odds::{probability_to_odds, round_odds, DEFAULT_HOUSE_MARGIN, MIN_ODDS};
pub use reach::{normal_cdf, GbmReachModel, HOURS_PER_YEAR};
pub use volatility::{estimate_volatility, VolatilityEstimate, VolatilitySource};

/// Parameters for a reach-probability calculation
#[derive(Debug, Clone, Copy)]
pub struct ReachParams {
    /// Current spot price
    pub current_price: f64,
    /// Candidate zone target
    pub target_price: f64,
    /// Per-candle (hourly) volatility of log returns
    pub volatility: f64,
    /// Hours until the zone window closes
    pub hours_to_expiry: f64,
    /// Annualized drift of log returns
    pub drift: f64,
}

/// Trait for reach-probability model implementations
pub trait ReachModel: Send + Sync {
    /// Probability in `[0.01, 0.99]` that price is within reach of the target at expiry
    fn reach_probability(&self, params: ReachParams) -> f64;
}
