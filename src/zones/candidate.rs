//! Zone candidate value type

use crate::market::ZoneKind;

/// A zone under construction: target, half-width margin and probability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneCandidate {
    /// Target price
    pub target: f64,
    /// Absolute half-width around the target
    pub margin: f64,
    /// Adjusted reach probability
    pub probability: f64,
    pub kind: ZoneKind,
    /// Offset from the current price in percent
    pub offset_pct: f64,
}

impl ZoneCandidate {
    pub fn lower(&self) -> f64 {
        self.target - self.margin
    }

    pub fn upper(&self) -> f64 {
        self.target + self.margin
    }

    /// Margin as a fraction of the target
    pub fn margin_ratio(&self) -> f64 {
        if self.target > 0.0 {
            self.margin / self.target
        } else {
            0.0
        }
    }

    /// Full band width in percent of the target, as persisted on a zone
    pub fn margin_percent(&self) -> f64 {
        200.0 * self.margin_ratio()
    }

    /// Length of the intersection of both intervals, 0 when disjoint
    pub fn overlap(&self, other: &ZoneCandidate) -> f64 {
        (self.upper().min(other.upper()) - self.lower().max(other.lower())).max(0.0)
    }

    /// Whether the overlap exceeds `tolerance` times the smaller margin
    pub fn overlaps(&self, other: &ZoneCandidate, tolerance: f64) -> bool {
        self.overlap(other) > tolerance * self.margin.min(other.margin)
    }
}
