//! Local-pivot support and resistance detection

use serde::{Deserialize, Serialize};

/// Maximum levels kept per side
const MAX_LEVELS: usize = 5;
/// Levels closer than this fraction of each other are merged
const DEDUP_TOLERANCE: f64 = 0.001;

/// Detected technical levels relative to the last close
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    /// Pivot lows below the last close, closest first
    pub supports: Vec<f64>,
    /// Pivot highs above the last close, closest first
    pub resistances: Vec<f64>,
}

/// Find pivot lows/highs that dominate `lookback` neighbors on each side
///
/// A bar is a support when no bar within `±lookback` has a lower low and a
/// resistance when none has a higher high. Only bars with a full window on
/// both sides are considered. Returns at most five of each, nearest to the
/// last close first, with near-duplicates merged.
pub fn support_resistance(highs: &[f64], lows: &[f64], closes: &[f64], lookback: usize) -> Levels {
    let n = highs.len().min(lows.len()).min(closes.len());
    let Some(&current) = closes[..n].last() else {
        return Levels::default();
    };
    if lookback == 0 || n < 2 * lookback + 1 {
        return Levels::default();
    }

    let mut supports = Vec::new();
    let mut resistances = Vec::new();
    for i in lookback..n - lookback {
        let window = i - lookback..=i + lookback;
        if window.clone().all(|j| lows[j] >= lows[i]) && lows[i] < current {
            supports.push(lows[i]);
        }
        if window.clone().all(|j| highs[j] <= highs[i]) && highs[i] > current {
            resistances.push(highs[i]);
        }
    }

    // Closest to the current price first
    supports.sort_by(|a, b| b.total_cmp(a));
    resistances.sort_by(|a, b| a.total_cmp(b));

    Levels {
        supports: dedup_levels(supports),
        resistances: dedup_levels(resistances),
    }
}

fn dedup_levels(sorted: Vec<f64>) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::with_capacity(MAX_LEVELS);
    for level in sorted {
        if !level.is_finite() || level <= 0.0 {
            continue;
        }
        if out
            .iter()
            .any(|kept| ((kept - level) / kept).abs() < DEDUP_TOLERANCE)
        {
            continue;
        }
        out.push(level);
        if out.len() == MAX_LEVELS {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Zig-zag series with pivots every 6 bars
    fn zigzag(len: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let closes: Vec<f64> = (0..len)
            .map(|i| {
                let phase = (i % 12) as f64;
                let tri = if phase < 6.0 { phase } else { 12.0 - phase };
                100.0 + tri - 3.0 + (i / 12) as f64 * 0.1
            })
            .collect();
        let highs = closes.iter().map(|c| c + 0.5).collect();
        let lows = closes.iter().map(|c| c - 0.5).collect();
        (highs, lows, closes)
    }

    #[test]
    fn test_detects_levels_on_both_sides() {
        let (highs, lows, mut closes) = zigzag(60);
        // Pin the last close to the middle of the range
        *closes.last_mut().unwrap() = 100.0;
        let levels = support_resistance(&highs, &lows, &closes, 5);
        assert!(!levels.supports.is_empty());
        assert!(!levels.resistances.is_empty());
        assert!(levels.supports.iter().all(|s| *s < 100.0));
        assert!(levels.resistances.iter().all(|r| *r > 100.0));
    }

    #[test]
    fn test_levels_sorted_closest_first_and_capped() {
        let (highs, lows, mut closes) = zigzag(240);
        *closes.last_mut().unwrap() = 101.0;
        let levels = support_resistance(&highs, &lows, &closes, 5);
        assert!(levels.supports.len() <= 5);
        assert!(levels.resistances.len() <= 5);
        assert!(levels.supports.windows(2).all(|w| w[0] > w[1]));
        assert!(levels.resistances.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_too_short_series() {
        let levels = support_resistance(&[1.0, 2.0], &[0.5, 1.5], &[0.8, 1.8], 5);
        assert_eq!(levels, Levels::default());
    }

    #[test]
    fn test_flat_series_dedups() {
        let highs = vec![101.0; 30];
        let lows = vec![99.0; 30];
        let closes = vec![100.0; 30];
        let levels = support_resistance(&highs, &lows, &closes, 5);
        assert_eq!(levels.supports, vec![99.0]);
        assert_eq!(levels.resistances, vec![101.0]);
    }
}
