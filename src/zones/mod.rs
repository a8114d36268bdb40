//! Zone generator
//!
//! Turns indicator readings and the reach model into K non-overlapping
//! zones per (asset, timeframe, period), then walks them outward so that
//! neighbours touch with a small gap.

mod candidate;
mod generator;
mod periods;
mod planner;
mod touch;
mod types;

pub use candidate::ZoneCandidate;
pub use generator::{ZoneGenerator, ZoneInputs};
pub use periods::{period_windows, PeriodWindow};
pub use planner::{plan_asset_zones, PlannedZoneSet, ZoneGenerationJob};
pub use touch::{touch_adjust, verify_touching};
pub use types::ZoneError;
