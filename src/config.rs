//! Configuration types for zone-odds

use crate::market::AssetGroup;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub rebalance: RebalanceConfig,
    #[serde(default)]
    pub settlement: SettlementConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Seed assets for the in-memory store
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
}

/// Zone generation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Seconds between generation passes
    #[serde(default = "default_generation_interval")]
    pub interval_secs: u64,
    /// Hourly candles loaded per asset
    #[serde(default = "default_history_candles")]
    pub history_candles: usize,
    /// Candle interval used for indicators
    #[serde(default = "default_candle_interval")]
    pub candle_interval: String,
    /// Periods closing sooner than this are skipped
    #[serde(default = "default_min_hours_to_expiry")]
    pub min_hours_to_expiry: f64,
    /// EWMA decay factor
    #[serde(default = "default_ewma_lambda")]
    pub ewma_lambda: f64,
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,
    #[serde(default = "default_bollinger_k")]
    pub bollinger_k: f64,
    /// Bars on each side a pivot must dominate
    #[serde(default = "default_pivot_lookback")]
    pub pivot_lookback: usize,
    /// House edge applied when turning probabilities into odds
    #[serde(default = "default_house_margin")]
    pub house_margin: f64,
    /// Gap between touching zones, percent of the midpoint price
    #[serde(default = "default_gap_pct")]
    pub gap_pct: f64,
    #[serde(default = "default_timeframes")]
    pub timeframes: Vec<TimeframeConfig>,
}

/// One wagering timeframe
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimeframeConfig {
    /// Window length in hours
    pub hours: u32,
    /// Consecutive windows generated ahead
    pub periods: u32,
    /// Zones per window
    pub zone_count: usize,
}

fn default_generation_interval() -> u64 {
    3600
}
fn default_history_candles() -> usize {
    200
}
fn default_candle_interval() -> String {
    "1h".to_string()
}
fn default_min_hours_to_expiry() -> f64 {
    0.5
}
fn default_ewma_lambda() -> f64 {
    crate::indicators::DEFAULT_EWMA_LAMBDA
}
fn default_rsi_period() -> usize {
    14
}
fn default_bollinger_period() -> usize {
    20
}
fn default_bollinger_k() -> f64 {
    2.0
}
fn default_pivot_lookback() -> usize {
    5
}
fn default_house_margin() -> f64 {
    crate::model::DEFAULT_HOUSE_MARGIN
}
fn default_gap_pct() -> f64 {
    0.15
}
fn default_timeframes() -> Vec<TimeframeConfig> {
    vec![
        TimeframeConfig {
            hours: 1,
            periods: 3,
            zone_count: 3,
        },
        TimeframeConfig {
            hours: 4,
            periods: 3,
            zone_count: 5,
        },
        TimeframeConfig {
            hours: 24,
            periods: 2,
            zone_count: 7,
        },
    ]
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_generation_interval(),
            history_candles: default_history_candles(),
            candle_interval: default_candle_interval(),
            min_hours_to_expiry: default_min_hours_to_expiry(),
            ewma_lambda: default_ewma_lambda(),
            rsi_period: default_rsi_period(),
            bollinger_period: default_bollinger_period(),
            bollinger_k: default_bollinger_k(),
            pivot_lookback: default_pivot_lookback(),
            house_margin: default_house_margin(),
            gap_pct: default_gap_pct(),
            timeframes: default_timeframes(),
        }
    }
}

/// Odds rebalancing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RebalanceConfig {
    #[serde(default = "default_rebalance_interval")]
    pub interval_secs: u64,
    #[serde(default)]
    pub policy: PolicyKind,
    /// Laplace pseudo-volume added to every zone
    #[serde(default = "default_smoothing_k")]
    pub smoothing_k: f64,
    #[serde(default = "default_laplace_margin")]
    pub laplace_margin: f64,
    #[serde(default = "default_inverse_margin")]
    pub inverse_margin: f64,
    /// Odds for a zone with no volume under the inverse-share policy
    #[serde(default = "default_zero_volume_odds")]
    pub zero_volume_odds: f64,
    #[serde(default = "default_min_rebalanced_odds")]
    pub min_odds: f64,
    /// Largest probability reduction applied to the latest period
    #[serde(default = "default_max_decay")]
    pub max_decay: f64,
    /// Decayed probability never drops below this share of the original
    #[serde(default = "default_decay_floor")]
    pub decay_floor: f64,
}

/// Rebalancing formula
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// `(volume + k) / sum(volume + k)`
    #[default]
    Laplace,
    /// `(total - volume) / volume`
    InverseShare,
}

fn default_rebalance_interval() -> u64 {
    300
}
fn default_smoothing_k() -> f64 {
    1.0
}
fn default_laplace_margin() -> f64 {
    0.98
}
fn default_inverse_margin() -> f64 {
    0.99
}
fn default_zero_volume_odds() -> f64 {
    2.5
}
fn default_min_rebalanced_odds() -> f64 {
    1.1
}
fn default_max_decay() -> f64 {
    0.4
}
fn default_decay_floor() -> f64 {
    0.6
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_rebalance_interval(),
            policy: PolicyKind::default(),
            smoothing_k: default_smoothing_k(),
            laplace_margin: default_laplace_margin(),
            inverse_margin: default_inverse_margin(),
            zero_volume_odds: default_zero_volume_odds(),
            min_odds: default_min_rebalanced_odds(),
            max_decay: default_max_decay(),
            decay_floor: default_decay_floor(),
        }
    }
}

/// Settlement configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SettlementConfig {
    #[serde(default = "default_settlement_interval")]
    pub interval_secs: u64,
    /// Wait after a window closes before finishing its wagers
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
    #[serde(default = "default_candle_interval")]
    pub candle_interval: String,
}

fn default_settlement_interval() -> u64 {
    60
}
fn default_grace_period() -> u64 {
    300
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_settlement_interval(),
            grace_period_secs: default_grace_period(),
            candle_interval: default_candle_interval(),
        }
    }
}

/// Market-data feed configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_keys: Vec<String>,
    /// Calls made with one key before rotating
    #[serde(default = "default_calls_per_key")]
    pub calls_per_key: u32,
    /// Sleep when the rotation wraps to the first key
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_exchange")]
    pub exchange: String,
    /// Pair quoted as quote-currency units per EUR
    #[serde(default = "default_fx_pair")]
    pub quote_fx_pair: String,
    /// Seconds between candle refresh passes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Candles requested per refresh
    #[serde(default = "default_refresh_candles")]
    pub refresh_candles: usize,
}

fn default_feed_url() -> String {
    crate::feed::DEFAULT_BASE_URL.to_string()
}
fn default_calls_per_key() -> u32 {
    8
}
fn default_cooldown() -> u64 {
    60
}
fn default_timeout() -> u64 {
    10
}
fn default_exchange() -> String {
    "default".to_string()
}
fn default_fx_pair() -> String {
    "EUR/USD".to_string()
}
fn default_refresh_interval() -> u64 {
    3600
}
fn default_refresh_candles() -> usize {
    48
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_feed_url(),
            api_keys: Vec::new(),
            calls_per_key: default_calls_per_key(),
            cooldown_secs: default_cooldown(),
            timeout_secs: default_timeout(),
            exchange: default_exchange(),
            quote_fx_pair: default_fx_pair(),
            refresh_interval_secs: default_refresh_interval(),
            refresh_candles: default_refresh_candles(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Prometheus listener port, 0 disables the exporter
    #[serde(default)]
    pub metrics_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormatConfig,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatConfig {
    #[default]
    Pretty,
    Json,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: 0,
            log_level: default_log_level(),
            log_format: LogFormatConfig::default(),
        }
    }
}

/// Seed asset entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetConfig {
    pub ticker: String,
    pub group: AssetGroup,
    #[serde(default)]
    pub price: Decimal,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
