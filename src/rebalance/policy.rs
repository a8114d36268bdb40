//! Rebalancing formulas

use crate::config::{PolicyKind, RebalanceConfig};
use crate::model::round_odds;

/// How a group's wagered volumes become odds
///
/// Exactly one policy is active; they are never blended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RebalancePolicy {
    /// `p = (v + k) / sum(v + k)`, `odds = max(min, round(margin / p, 2))`
    Laplace {
        smoothing_k: f64,
        margin: f64,
        min_odds: f64,
    },
    /// `odds = max(min, round((total - v) / v * margin, 2))`, fixed odds for `v = 0`
    InverseShare {
        margin: f64,
        zero_volume_odds: f64,
        min_odds: f64,
    },
}

impl RebalancePolicy {
    pub fn from_config(config: &RebalanceConfig) -> Self {
        match config.policy {
            PolicyKind::Laplace => Self::Laplace {
                smoothing_k: config.smoothing_k,
                margin: config.laplace_margin,
                min_odds: config.min_odds,
            },
            PolicyKind::InverseShare => Self::InverseShare {
                margin: config.inverse_margin,
                zero_volume_odds: config.zero_volume_odds,
                min_odds: config.min_odds,
            },
        }
    }

    /// Odds for every zone of one group, in input order
    ///
    /// `decay` scales the implied probabilities of later periods down
    /// (1.0 leaves them untouched), which raises their odds.
    pub fn odds(&self, volumes: &[f64], decay: f64) -> Vec<f64> {
        let decay = if decay.is_finite() && decay > 0.0 { decay } else { 1.0 };

        match *self {
            Self::Laplace {
                smoothing_k,
                margin,
                min_odds,
            } => {
                let total: f64 = volumes.iter().map(|v| v + smoothing_k).sum();
                volumes
                    .iter()
                    .map(|v| {
                        if total <= 0.0 {
                            return min_odds;
                        }
                        let probability = (v + smoothing_k) / total * decay;
                        if probability <= 0.0 {
                            return min_odds;
                        }
                        round_odds(margin / probability).max(min_odds)
                    })
                    .collect()
            }
            Self::InverseShare {
                margin,
                zero_volume_odds,
                min_odds,
            } => {
                let total: f64 = volumes.iter().sum();
                volumes
                    .iter()
                    .map(|&v| {
                        if v <= 0.0 {
                            return zero_volume_odds;
                        }
                        round_odds((total - v) / v * margin / decay).max(min_odds)
                    })
                    .collect()
            }
        }
    }
}
