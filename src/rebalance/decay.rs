//! Period time decay

/// Probability multiplier for the period at `index` of `period_count`
///
/// Falls linearly from 1.0 for the nearest period to `1 - max_decay` for
/// the furthest, never below `floor`.
pub fn decay_factor(index: usize, period_count: usize, max_decay: f64, floor: f64) -> f64 {
    if period_count <= 1 {
        return 1.0;
    }
    let position = index.min(period_count - 1) as f64 / (period_count - 1) as f64;
    (1.0 - max_decay * position).max(floor).min(1.0)
}
