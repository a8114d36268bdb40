//! Market domain types
//!
//! Candles, assets, zones and wagers shared by the zone engine and its
//! persistence collaborators

mod asset;
mod candle;
mod wager;
mod zone;

pub use asset::{Asset, AssetGroup};
pub use candle::{Candle, CandleKey};
pub use wager::{Wager, WagerId, WagerState, WagerStatus};
pub use zone::{Currency, Zone, ZoneId, ZoneKind};

/// Convert a decimal to `f64`, falling back to zero like the model code does
pub(crate) fn to_f64(value: rust_decimal::Decimal) -> f64 {
    value.try_into().unwrap_or(0.0)
}
