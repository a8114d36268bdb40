//! Benchmarks for reach probability and zone planning

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use zone_odds::config::GenerationConfig;
use zone_odds::market::Candle;
use zone_odds::model::{GbmReachModel, ReachModel, ReachParams};
use zone_odds::zones::{plan_asset_zones, ZoneGenerator};

fn benchmark_reach_probability(c: &mut Criterion) {
    let model = GbmReachModel::new();

    let params = ReachParams {
        current_price: 100.0,
        target_price: 102.5,
        volatility: 0.008,
        hours_to_expiry: 4.0,
        drift: 0.05,
    };

    c.bench_function("gbm_reach_probability", |b| {
        b.iter(|| model.reach_probability(black_box(params)))
    });
}

fn benchmark_plan_asset_zones(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 0).unwrap();
    let candles: Vec<Candle> = (0..200)
        .map(|i| {
            let wave = ((i as f64) * 0.7).sin() * 1.5 + (i as f64) * 0.01;
            let close = Decimal::try_from(100.0 + wave).unwrap().round_dp(4);
            Candle {
                asset_id: "AAPL".to_string(),
                exchange: "bench".to_string(),
                interval: "1h".to_string(),
                timestamp: now - Duration::hours(200 - i),
                open: close,
                high: close + dec!(0.4),
                low: close - dec!(0.4),
                close,
            }
        })
        .collect();
    let config = GenerationConfig::default();
    let generator = ZoneGenerator::new(GbmReachModel::new(), config.gap_pct);

    c.bench_function("plan_asset_zones_default_timeframes", |b| {
        b.iter(|| plan_asset_zones(&config, &generator, black_box(100.0), black_box(&candles), now))
    });
}

criterion_group!(
    benches,
    benchmark_reach_probability,
    benchmark_plan_asset_zones
);
criterion_main!(benches);
