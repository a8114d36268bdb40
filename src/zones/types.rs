//! Zone generation errors

use thiserror::Error;

/// Why an asset, timeframe or period produced no zones
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ZoneError {
    /// Fewer candles than the indicators need
    #[error("Not enough candles: need {required}, have {available}")]
    InsufficientData { required: usize, available: usize },
    /// Period closes too soon to be worth offering
    #[error("Time window too short: {hours:.2}h to expiry")]
    WindowTooShort { hours: f64 },
    /// NaN, infinite or non-positive input
    #[error("Invalid numeric input: {0}")]
    InvalidNumeric(String),
    /// Generator could not place any zone
    #[error("No zones could be generated")]
    NoZones,
}
