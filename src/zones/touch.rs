//! Touch adjustment
//!
//! Re-places zones outward from the anchor so each near edge sits exactly
//! `gap_pct` percent of the midpoint price beyond its neighbour's far edge.
//! Margin ratios are held fixed.

use super::ZoneCandidate;
use crate::market::ZoneKind;

/// Smallest margin ratio a walked zone keeps
const MIN_MARGIN_RATIO: f64 = 0.01;
/// Keeps `1 - m` well away from zero when placing zones above
const MAX_MARGIN_RATIO: f64 = 0.5;
/// Relative drift tolerated by the verification pass
const GAP_TOLERANCE: f64 = 1e-9;

/// Walk zones outward from the anchor and make neighbours touch
///
/// `zones` is sorted by price. When it contains a `Current` zone that zone
/// is the anchor and stays put; otherwise `anchor` supplies the starting
/// bounds. Zones that would land at a non-positive price are dropped.
/// Returns the number of corrections made by the final verification pass.
pub fn touch_adjust(zones: &mut Vec<ZoneCandidate>, anchor: &ZoneCandidate, gap_pct: f64) -> usize {
    zones.sort_by(|a, b| a.target.total_cmp(&b.target));
    let g = gap_pct / 100.0;
    walk(zones, anchor, g, false);
    verify_touching(zones, anchor, gap_pct)
}

/// Re-check every adjacent pair and correct drift, returning how many zones moved
pub fn verify_touching(zones: &mut Vec<ZoneCandidate>, anchor: &ZoneCandidate, gap_pct: f64) -> usize {
    walk(zones, anchor, gap_pct / 100.0, true)
}

fn walk(zones: &mut Vec<ZoneCandidate>, anchor: &ZoneCandidate, g: f64, only_drift: bool) -> usize {
    let (below_end, above_start, anchor_bounds) =
        match zones.iter().position(|z| z.kind == ZoneKind::Current) {
            Some(i) => (i, i + 1, (zones[i].lower(), zones[i].upper())),
            None => {
                let split = zones.partition_point(|z| z.target < anchor.target);
                (split, split, (anchor.lower(), anchor.upper()))
            }
        };

    let mut moved = 0;

    // Above first so the below-side drain does not shift these indices
    let mut edge = anchor_bounds.1;
    let mut truncate_at = None;
    for i in above_start..zones.len() {
        let m = zones[i].margin_ratio().clamp(MIN_MARGIN_RATIO, MAX_MARGIN_RATIO);
        match place_above(edge, m, g) {
            Some(target) => {
                moved += usize::from(settle(&mut zones[i], target, m, only_drift));
                edge = zones[i].upper();
            }
            None => {
                truncate_at = Some(i);
                break;
            }
        }
    }
    if let Some(i) = truncate_at {
        zones.truncate(i);
    }

    let mut edge = anchor_bounds.0;
    let mut drop_through = None;
    for i in (0..below_end).rev() {
        let m = zones[i].margin_ratio().clamp(MIN_MARGIN_RATIO, MAX_MARGIN_RATIO);
        match place_below(edge, m, g) {
            Some(target) => {
                moved += usize::from(settle(&mut zones[i], target, m, only_drift));
                edge = zones[i].lower();
            }
            None => {
                drop_through = Some(i);
                break;
            }
        }
    }
    if let Some(i) = drop_through {
        zones.drain(..=i);
    }

    moved
}

/// Move a zone to `target`, reporting whether it moved
fn settle(zone: &mut ZoneCandidate, target: f64, m: f64, only_drift: bool) -> bool {
    let drifted = (zone.target - target).abs() > GAP_TOLERANCE * target.abs().max(1.0)
        || (zone.margin - target * m).abs() > GAP_TOLERANCE * target.abs().max(1.0);
    if only_drift && !drifted {
        return false;
    }
    zone.target = target;
    zone.margin = target * m;
    drifted
}

/// Target whose upper edge sits one gap below `edge`
///
/// gap = g * (edge + upper) / 2 with upper = edge - gap.
fn place_below(edge: f64, m: f64, g: f64) -> Option<f64> {
    let gap = g * edge / (1.0 + g / 2.0);
    let target = (edge - gap) / (1.0 + m);
    (target.is_finite() && target > 0.0).then_some(target)
}

/// Target whose lower edge sits one gap above `edge`
fn place_above(edge: f64, m: f64, g: f64) -> Option<f64> {
    let gap = g * edge / (1.0 - g / 2.0);
    let target = (edge + gap) / (1.0 - m);
    (target.is_finite() && target > 0.0).then_some(target)
}

/// Expected gap between a lower zone's upper edge and the next zone's lower edge
#[cfg(test)]
pub(crate) fn expected_gap(upper_edge: f64, lower_edge: f64, gap_pct: f64) -> f64 {
    gap_pct / 100.0 * (upper_edge + lower_edge) / 2.0
}
