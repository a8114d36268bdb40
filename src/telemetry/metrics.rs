//! Prometheus metrics

use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyMetric {
    /// Candle refresh pass
    RefreshPass,
    /// Zone generation pass
    GenerationPass,
    /// Odds rebalancing pass
    RebalancePass,
    /// Settlement pass
    SettlementPass,
    /// Single market-data request
    FeedRequest,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeMetric {
    /// Active zones after the last generation pass
    ActiveZones,
    /// Latest EUR rate used for the secondary ledger
    FxRate,
}

/// Counter metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterMetric {
    ZonesGenerated,
    ZonesRebalanced,
    WagersLost,
    WagersWon,
    WagersPaid,
    /// Assets skipped inside a pass
    AssetsSkipped,
    FeedCalls,
    /// Sleeps after the key rotation wrapped
    FeedCooldowns,
    PassFailures,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::RefreshPass => "zoneodds_refresh_pass_ms",
        LatencyMetric::GenerationPass => "zoneodds_generation_pass_ms",
        LatencyMetric::RebalancePass => "zoneodds_rebalance_pass_ms",
        LatencyMetric::SettlementPass => "zoneodds_settlement_pass_ms",
        LatencyMetric::FeedRequest => "zoneodds_feed_request_ms",
    };

    ::metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::ActiveZones => "zoneodds_active_zones",
        GaugeMetric::FxRate => "zoneodds_fx_rate",
    };

    ::metrics::gauge!(metric_name).set(value);
}

/// Increment a counter
pub fn incr_counter(metric: CounterMetric, value: u64) {
    let metric_name = match metric {
        CounterMetric::ZonesGenerated => "zoneodds_zones_generated_total",
        CounterMetric::ZonesRebalanced => "zoneodds_zones_rebalanced_total",
        CounterMetric::WagersLost => "zoneodds_wagers_lost_total",
        CounterMetric::WagersWon => "zoneodds_wagers_won_total",
        CounterMetric::WagersPaid => "zoneodds_wagers_paid_total",
        CounterMetric::AssetsSkipped => "zoneodds_assets_skipped_total",
        CounterMetric::FeedCalls => "zoneodds_feed_calls_total",
        CounterMetric::FeedCooldowns => "zoneodds_feed_cooldowns_total",
        CounterMetric::PassFailures => "zoneodds_pass_failures_total",
    };

    ::metrics::counter!(metric_name).increment(value);
}
