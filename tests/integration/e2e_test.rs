//! End-to-end integration tests
//!
//! Generation, wagering, rebalancing and settlement against one store.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;
use zone_odds::config::{Config, GenerationConfig, RebalanceConfig, SettlementConfig, TimeframeConfig};
use zone_odds::market::{Asset, AssetGroup, Candle, Currency, Wager, WagerState, Zone};
use zone_odds::model::GbmReachModel;
use zone_odds::rebalance::RebalanceJob;
use zone_odds::scheduler::{shutdown_channel, Job};
use zone_odds::settlement::SettlementJob;
use zone_odds::store::{MarketStore, MemoryStore};
use zone_odds::zones::ZoneGenerationJob;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 0).unwrap()
}

fn candle(timestamp: DateTime<Utc>, close: Decimal, spread: Decimal) -> Candle {
    Candle {
        asset_id: "AAPL".to_string(),
        exchange: "test".to_string(),
        interval: "1h".to_string(),
        timestamp,
        open: close,
        high: close + spread,
        low: close - spread,
        close,
    }
}

/// Sixty hourly bars oscillating around 100
fn history() -> Vec<Candle> {
    let start = now() - Duration::hours(60);
    (0..60)
        .map(|i| {
            let wave = ((i as f64) * 0.7).sin() * 1.5;
            let close = Decimal::try_from(100.0 + wave).unwrap().round_dp(4);
            candle(start + Duration::hours(i), close, dec!(0.4))
        })
        .collect()
}

fn generation_config() -> GenerationConfig {
    GenerationConfig {
        timeframes: vec![TimeframeConfig {
            hours: 1,
            periods: 2,
            zone_count: 3,
        }],
        ..GenerationConfig::default()
    }
}

fn contains(zone: &Zone, price: Decimal) -> bool {
    zone.lower_bound() <= price && price <= zone.upper_bound()
}

#[tokio::test]
async fn test_zone_lifecycle() {
    let store = MemoryStore::with_assets([Asset::new("AAPL", AssetGroup::Shares, dec!(100))]);
    store.upsert_candles(history()).await.unwrap();
    let shared: Arc<dyn MarketStore> = Arc::new(store.clone());
    let (_trigger, shutdown) = shutdown_channel();

    // Generate
    let generation = ZoneGenerationJob::new(
        shared.clone(),
        GbmReachModel::new(),
        generation_config(),
        "EUR/USD",
    );
    let report = generation.run_pass(now(), &shutdown).await.unwrap();
    assert_eq!(report.skipped, 0);
    assert!(report.changed >= 2);

    let first_start = Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap();
    let zones: Vec<Zone> = store
        .get_active_zones("AAPL", 1)
        .await
        .unwrap()
        .into_iter()
        .filter(|z| z.start_time == first_start)
        .collect();
    assert!(zones.len() >= 2, "need two zones, got {}", zones.len());
    assert!(zones.iter().all(|z| z.currency == Currency::Usd));

    let assets = store.get_all_assets().await.unwrap();
    assert!(assets[0].max_odd.is_some());

    let inside = zones
        .iter()
        .find(|z| contains(z, dec!(100)))
        .unwrap_or(&zones[0])
        .clone();
    let outside = zones.iter().find(|z| z.id != inside.id).unwrap().clone();

    // Wager
    let winner = Wager::new(Uuid::new_v4(), "AAPL", inside.id, Currency::Usd, dec!(30), dec!(100), inside.target_odds);
    let loser = Wager::new(Uuid::new_v4(), "AAPL", outside.id, Currency::Usd, dec!(70), dec!(100), outside.target_odds);
    store.insert_wager(winner.clone()).await.unwrap();
    store.insert_wager(loser.clone()).await.unwrap();

    // Rebalance: the lighter side gets the longer odds
    let rebalance = RebalanceJob::new(shared.clone(), RebalanceConfig::default());
    rebalance.run_pass(now(), &shutdown).await.unwrap();
    let repriced = store.get_zones(&[inside.id, outside.id]).await.unwrap();
    let odds = |id| repriced.iter().find(|z| z.id == id).unwrap().target_odds;
    assert!(odds(inside.id) > odds(outside.id));

    // Price sits on the winning zone's target for the whole window
    store
        .upsert_candles(vec![candle(first_start, inside.target_price, Decimal::ZERO)])
        .await
        .unwrap();

    let settlement = SettlementJob::new(shared, SettlementConfig::default(), "EUR/USD");
    let after_close = first_start + Duration::hours(1) + Duration::minutes(6);
    settlement.run_pass(after_close, &shutdown).await.unwrap();

    let winner = store.wager(winner.id).await.unwrap();
    let loser = store.wager(loser.id).await.unwrap();
    assert_eq!(winner.state(), WagerState::Paid);
    assert_eq!(loser.state(), WagerState::Finished);

    // Payout uses the odds snapshot taken at placement
    let balance = store.get_balance(winner.user_id, Currency::Usd).await.unwrap();
    assert_eq!(balance, dec!(30) * inside.target_odds);
    assert_eq!(store.get_balance(loser.user_id, Currency::Usd).await.unwrap(), Decimal::ZERO);

    // A second pass changes nothing
    let report = settlement.run_pass(after_close, &shutdown).await.unwrap();
    assert_eq!(report.changed, 0);
    assert_eq!(store.get_balance(winner.user_id, Currency::Usd).await.unwrap(), balance);
}

#[tokio::test]
async fn test_regeneration_supersedes_previous_zones() {
    let store = MemoryStore::with_assets([Asset::new("AAPL", AssetGroup::Shares, dec!(100))]);
    store.upsert_candles(history()).await.unwrap();
    let job = ZoneGenerationJob::new(
        Arc::new(store.clone()),
        GbmReachModel::new(),
        generation_config(),
        "EUR/USD",
    );
    let (_trigger, shutdown) = shutdown_channel();

    job.run_pass(now(), &shutdown).await.unwrap();
    let first = store.get_all_active_zones().await.unwrap();
    job.run_pass(now() + Duration::minutes(30), &shutdown).await.unwrap();
    let second = store.get_all_active_zones().await.unwrap();

    assert!(!second.is_empty());
    assert!(first.iter().all(|a| second.iter().all(|b| a.id != b.id)));
    assert_eq!(store.zones_for("AAPL").await.len(), first.len() + second.len());
}

#[test]
fn test_default_config_round_trips_through_toml() {
    let config = Config::default();
    let rendered = toml::to_string_pretty(&config).unwrap();
    let parsed: Config = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed.generation.timeframes, config.generation.timeframes);
    assert_eq!(parsed.feed.quote_fx_pair, "EUR/USD");
}
