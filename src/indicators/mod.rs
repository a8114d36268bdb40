//! Indicator library
//!
//! Pure functions over price series used by zone generation. Only what
//! the generator needs lives here.

mod bollinger;
mod levels;
mod returns;
mod rsi;
mod variation;

pub use bollinger::{bollinger_bands, BollingerBands};
pub use levels::{support_resistance, Levels};
pub use returns::{drift, ewma_volatility, log_returns};
pub use rsi::rsi;
pub use variation::max_variation_for_horizon;

/// RiskMetrics decay factor
pub const DEFAULT_EWMA_LAMBDA: f64 = 0.94;
/// Neutral RSI reading
pub const NEUTRAL_RSI: f64 = 50.0;
