//! Zone candidate generation and selection

use super::{touch_adjust, ZoneCandidate, ZoneError};
use crate::indicators::{BollingerBands, Levels};
use crate::market::ZoneKind;
use crate::model::{ReachModel, ReachParams};

/// Probability assigned to the "stay near current price" zone
const CURRENT_BASE_PROBABILITY: f64 = 0.88;
/// Current-zone margin: 1% of price plus up to 0.25% with volatility
const CURRENT_MARGIN_PCT: f64 = 1.0;
const CURRENT_MARGIN_VOL_BONUS_PCT: f64 = 0.25;
const CURRENT_MARGIN_VOL_REFERENCE: f64 = 0.02;

/// Levels within this many percent of an offset are snapped to
const SNAP_TOLERANCE_PCT: f64 = 0.75;
const SNAPPED_MARGIN_FLOOR: f64 = 0.01;
const SNAPPED_MARGIN_VOL_MULTIPLIER: f64 = 1.5;

/// Raw-offset margins scale between these with distance from price
const MIN_MARGIN_PCT: f64 = 0.5;
const MAX_MARGIN_PCT: f64 = 1.5;
const MAX_GRID_OFFSET_PCT: f64 = 10.0;

const GRID_STEP_PCT: f64 = 0.75;
const LONG_HORIZON_HOURS: f64 = 12.0;

const OVERSOLD_RSI: f64 = 30.0;
const OVERBOUGHT_RSI: f64 = 70.0;
const RSI_NUDGE: f64 = 0.15;
const DISTANCE_ATTENUATION: f64 = 0.3;
const ATTENUATION_FLOOR: f64 = 0.5;
const PROBABILITY_FLOOR: f64 = 0.15;
const PROBABILITY_CEILING: f64 = 0.75;
const LOW_PROBABILITY: f64 = 0.30;
const LOW_PROBABILITY_WIDENING: f64 = 1.3;

const FILL_SPACING_PCT: f64 = 0.75;
const MAX_FILL_STEPS: usize = 40;
const MAX_FILL_ITERATIONS: usize = 100;

/// Indicator readings and sizing for one (asset, timeframe, period)
#[derive(Debug, Clone)]
pub struct ZoneInputs<'a> {
    pub current_price: f64,
    pub levels: &'a Levels,
    pub bands: Option<BollingerBands>,
    /// Per-candle volatility of log returns
    pub volatility: f64,
    pub hours_to_expiry: f64,
    pub rsi: f64,
    /// Annualized drift
    pub drift: f64,
    /// K, the number of zones to produce
    pub zone_count: usize,
    /// Windowed max variation in percent, when available
    pub max_variation_pct: Option<f64>,
}

/// Builds non-overlapping, touching zone sets
pub struct ZoneGenerator<M> {
    model: M,
    gap_pct: f64,
}

impl<M: ReachModel> ZoneGenerator<M> {
    /// Create a generator using `model` and a touch gap of `gap_pct` percent
    pub fn new(model: M, gap_pct: f64) -> Self {
        Self { model, gap_pct }
    }

    /// Produce exactly `zone_count` zones sorted by price, when possible
    pub fn generate(&self, inputs: &ZoneInputs<'_>) -> Result<Vec<ZoneCandidate>, ZoneError> {
        validate(inputs)?;

        let k = inputs.zone_count;
        let tolerance = overlap_tolerance(k);
        let current = self.current_zone(inputs);
        let mut accepted = vec![current];

        for offset in candidate_offsets(k, inputs.hours_to_expiry) {
            if let Some(candidate) = self.candidate_at(inputs, offset, true) {
                if !accepted.iter().any(|z| z.overlaps(&candidate, tolerance)) {
                    accepted.push(candidate);
                }
            }
        }

        self.fill(inputs, &mut accepted, tolerance);

        let mut selected = select(&accepted, inputs.current_price, k);
        if selected.is_empty() {
            return Err(ZoneError::NoZones);
        }
        if selected.len() < k {
            tracing::warn!(
                wanted = k,
                produced = selected.len(),
                "Zone generator produced fewer zones than requested"
            );
        }

        let corrections = touch_adjust(&mut selected, &current, self.gap_pct);
        if corrections > 0 {
            tracing::debug!(corrections, "Touch verification corrected zone drift");
        }

        // Targets moved, so re-price everything but the current zone
        for zone in selected.iter_mut().filter(|z| z.kind != ZoneKind::Current) {
            zone.offset_pct = (zone.target / inputs.current_price - 1.0) * 100.0;
            zone.probability = self.adjusted_probability(inputs, zone.target, zone.offset_pct);
        }

        Ok(selected)
    }

    fn current_zone(&self, inputs: &ZoneInputs<'_>) -> ZoneCandidate {
        let vol_share = (inputs.volatility / CURRENT_MARGIN_VOL_REFERENCE).min(1.0);
        let margin_pct = CURRENT_MARGIN_PCT + CURRENT_MARGIN_VOL_BONUS_PCT * vol_share;
        ZoneCandidate {
            target: inputs.current_price,
            margin: inputs.current_price * margin_pct / 100.0,
            probability: CURRENT_BASE_PROBABILITY,
            kind: ZoneKind::Current,
            offset_pct: 0.0,
        }
    }

    /// Candidate at `offset` percent, snapped to a nearby level when allowed
    fn candidate_at(&self, inputs: &ZoneInputs<'_>, offset: f64, allow_snap: bool) -> Option<ZoneCandidate> {
        let price = inputs.current_price;
        let snapped = if allow_snap { snap(inputs, offset) } else { None };

        let (target, kind, mut margin, offset_pct) = match snapped {
            Some((level, kind)) => {
                let margin = (SNAPPED_MARGIN_FLOOR * level)
                    .max(SNAPPED_MARGIN_VOL_MULTIPLIER * inputs.volatility * level);
                (level, kind, margin, (level / price - 1.0) * 100.0)
            }
            None => {
                let target = price * (1.0 + offset / 100.0);
                let kind = if offset < 0.0 {
                    ZoneKind::Below
                } else {
                    ZoneKind::Above
                };
                (target, kind, raw_margin(inputs, target, offset), offset)
            }
        };

        if !(target.is_finite() && target > 0.0 && margin.is_finite() && margin > 0.0) {
            return None;
        }

        let probability = self.adjusted_probability(inputs, target, offset_pct);
        if probability < LOW_PROBABILITY {
            margin *= LOW_PROBABILITY_WIDENING;
        }

        Some(ZoneCandidate {
            target,
            margin,
            probability,
            kind,
            offset_pct,
        })
    }

    /// Reach probability with RSI nudges and distance attenuation, clamped
    fn adjusted_probability(&self, inputs: &ZoneInputs<'_>, target: f64, offset_pct: f64) -> f64 {
        let mut p = self.model.reach_probability(ReachParams {
            current_price: inputs.current_price,
            target_price: target,
            volatility: inputs.volatility,
            hours_to_expiry: inputs.hours_to_expiry,
            drift: inputs.drift,
        });

        if inputs.rsi < OVERSOLD_RSI && offset_pct < 0.0 {
            p *= 1.0 + RSI_NUDGE * ((OVERSOLD_RSI - inputs.rsi) / OVERSOLD_RSI);
        } else if inputs.rsi > OVERBOUGHT_RSI && offset_pct > 0.0 {
            p *= 1.0 - RSI_NUDGE * ((inputs.rsi - OVERBOUGHT_RSI) / (100.0 - OVERBOUGHT_RSI));
        }

        p *= (1.0 - DISTANCE_ATTENUATION * offset_pct.abs()).max(ATTENUATION_FLOOR);
        p.clamp(PROBABILITY_FLOOR, PROBABILITY_CEILING)
    }

    /// Top up each side with evenly spaced raw offsets until its quota is met
    fn fill(&self, inputs: &ZoneInputs<'_>, accepted: &mut Vec<ZoneCandidate>, tolerance: f64) {
        let (need_below, need_above) = side_quota(inputs.zone_count);

        for _ in 0..MAX_FILL_ITERATIONS {
            let mut added = false;
            for side in [1.0, -1.0] {
                let (below, above) = side_counts(accepted, inputs.current_price);
                let short = if side > 0.0 {
                    above < need_above
                } else {
                    below < need_below
                };
                if !short {
                    continue;
                }

                let next = (1..=MAX_FILL_STEPS)
                    .map(|step| side * FILL_SPACING_PCT * step as f64)
                    .take_while(|offset| *offset > -100.0)
                    .filter_map(|offset| self.candidate_at(inputs, offset, false))
                    .find(|c| !accepted.iter().any(|z| z.overlaps(c, tolerance)));

                if let Some(candidate) = next {
                    accepted.push(candidate);
                    added = true;
                }
            }

            let (below, above) = side_counts(accepted, inputs.current_price);
            if !added || (below >= need_below && above >= need_above) {
                break;
            }
        }
    }
}

fn validate(inputs: &ZoneInputs<'_>) -> Result<(), ZoneError> {
    if !(inputs.current_price.is_finite() && inputs.current_price > 0.0) {
        return Err(ZoneError::InvalidNumeric(format!(
            "current price {}",
            inputs.current_price
        )));
    }
    if !(inputs.volatility.is_finite() && inputs.volatility >= 0.0) {
        return Err(ZoneError::InvalidNumeric(format!(
            "volatility {}",
            inputs.volatility
        )));
    }
    if !(inputs.hours_to_expiry.is_finite() && inputs.hours_to_expiry > 0.0) {
        return Err(ZoneError::WindowTooShort {
            hours: inputs.hours_to_expiry,
        });
    }
    if inputs.zone_count == 0 {
        return Err(ZoneError::NoZones);
    }
    Ok(())
}

/// Allowed overlap as a share of the smaller margin
fn overlap_tolerance(zone_count: usize) -> f64 {
    if zone_count <= 3 {
        0.20
    } else {
        0.10
    }
}

/// Absolute margin floor in percent of target
fn margin_floor_pct(zone_count: usize) -> f64 {
    if zone_count <= 3 {
        1.0
    } else {
        0.75
    }
}

/// Percentage offsets to try, nearest first
fn candidate_offsets(zone_count: usize, hours_to_expiry: f64) -> Vec<f64> {
    let mut offsets = if zone_count <= 3 {
        vec![-2.5, 2.5, -4.0, 4.0]
    } else {
        // -6..-1 and 1..6 in 0.75 steps
        let mut grid = Vec::new();
        for i in 0..=6 {
            grid.push(-6.0 + GRID_STEP_PCT * i as f64);
            grid.push(1.0 + GRID_STEP_PCT * i as f64);
        }
        if hours_to_expiry > LONG_HORIZON_HOURS {
            grid.extend([-7.5, 7.5, -9.0, 9.0, -10.0, 10.0]);
        }
        grid
    };
    offsets.sort_by(|a: &f64, b: &f64| a.abs().total_cmp(&b.abs()).then(a.total_cmp(b)));
    offsets
}

/// Closest technical level on the same side as `offset` within the snap tolerance
fn snap(inputs: &ZoneInputs<'_>, offset: f64) -> Option<(f64, ZoneKind)> {
    let price = inputs.current_price;
    let bands = inputs
        .bands
        .iter()
        .flat_map(|b| [b.lower, b.middle, b.upper])
        .map(|level| (level, ZoneKind::Bollinger));
    let levels = inputs
        .levels
        .supports
        .iter()
        .map(|s| (*s, ZoneKind::Support))
        .chain(inputs.levels.resistances.iter().map(|r| (*r, ZoneKind::Resistance)))
        .chain(bands);

    levels
        .filter(|(level, _)| level.is_finite() && *level > 0.0)
        .map(|(level, kind)| ((level / price - 1.0) * 100.0, level, kind))
        .filter(|(pct, _, _)| pct * offset > 0.0 && (pct - offset).abs() <= SNAP_TOLERANCE_PCT)
        .min_by(|a, b| (a.0 - offset).abs().total_cmp(&(b.0 - offset).abs()))
        .map(|(_, level, kind)| (level, kind))
}

/// Margin for an unsnapped offset, widening with distance
fn raw_margin(inputs: &ZoneInputs<'_>, target: f64, offset: f64) -> f64 {
    let mut max_pct = MAX_MARGIN_PCT;
    if let Some(variation) = inputs
        .max_variation_pct
        .filter(|v| v.is_finite() && *v > 0.0)
    {
        max_pct *= 1.0 + variation / 100.0;
    }

    let distance = (offset.abs() / MAX_GRID_OFFSET_PCT).min(1.0);
    let pct = MIN_MARGIN_PCT + (max_pct - MIN_MARGIN_PCT) * distance;
    target * pct.max(margin_floor_pct(inputs.zone_count)) / 100.0
}

/// Zones wanted strictly below and above price
///
/// K=2 offers one of each without the current zone; otherwise the current
/// zone takes one slot and the rest split evenly, the extra going above.
fn side_quota(zone_count: usize) -> (usize, usize) {
    let slots = if zone_count == 2 {
        2
    } else {
        zone_count.saturating_sub(1)
    };
    let below = slots / 2;
    (below, slots - below)
}

fn side_counts(zones: &[ZoneCandidate], price: f64) -> (usize, usize) {
    let movable = zones.iter().filter(|z| z.kind != ZoneKind::Current);
    let (mut below, mut above) = (0, 0);
    for zone in movable {
        if zone.target < price {
            below += 1;
        } else {
            above += 1;
        }
    }
    (below, above)
}

/// Pick exactly `zone_count` zones and sort them by price
fn select(accepted: &[ZoneCandidate], price: f64, zone_count: usize) -> Vec<ZoneCandidate> {
    let current = accepted.iter().find(|z| z.kind == ZoneKind::Current).copied();
    let mut below: Vec<ZoneCandidate> = accepted
        .iter()
        .filter(|z| z.kind != ZoneKind::Current && z.target < price)
        .copied()
        .collect();
    let mut above: Vec<ZoneCandidate> = accepted
        .iter()
        .filter(|z| z.kind != ZoneKind::Current && z.target >= price)
        .copied()
        .collect();
    below.sort_by(|a, b| b.target.total_cmp(&a.target));
    above.sort_by(|a, b| a.target.total_cmp(&b.target));

    let include_current = zone_count != 2;
    let (need_below, need_above) = side_quota(zone_count);

    let mut selected = Vec::with_capacity(zone_count);
    if include_current {
        selected.extend(current);
    }
    selected.extend(below.iter().take(need_below));
    selected.extend(above.iter().take(need_above));

    // Backfill with the most likely leftovers
    let mut rest: Vec<ZoneCandidate> = below
        .iter()
        .skip(need_below)
        .chain(above.iter().skip(need_above))
        .copied()
        .collect();
    if !include_current {
        rest.extend(current);
    }
    rest.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    for candidate in rest {
        if selected.len() >= zone_count {
            break;
        }
        selected.push(candidate);
    }

    selected.truncate(zone_count);
    selected.sort_by(|a, b| a.target.total_cmp(&b.target));
    selected
}
