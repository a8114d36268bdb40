//! Integration tests for the candle feed and refresh job

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};
use zone_odds::config::FeedConfig;
use zone_odds::feed::{parse_time_series, CandleRefreshJob, FeedError, MarketDataFeed};
use zone_odds::market::{Asset, AssetGroup, Candle};
use zone_odds::scheduler::{shutdown_channel, Job};
use zone_odds::store::{MarketStore, MemoryStore};

/// Feed serving three rising bars per symbol and a fixed EUR rate
#[derive(Default)]
struct ScriptedFeed {
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MarketDataFeed for ScriptedFeed {
    async fn fetch_candles(
        &self,
        api_key: &str,
        symbol: &str,
        interval: &str,
        count: usize,
    ) -> Result<Vec<Candle>, FeedError> {
        self.calls
            .lock()
            .unwrap()
            .push((api_key.to_string(), symbol.to_string()));
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap();
        Ok((0..count.min(3))
            .map(|i| {
                let close = dec!(100) + Decimal::from(i as u32);
                Candle {
                    asset_id: symbol.to_string(),
                    exchange: "scripted".to_string(),
                    interval: interval.to_string(),
                    timestamp: start + Duration::hours(i as i64),
                    open: close,
                    high: close + dec!(0.5),
                    low: close - dec!(0.5),
                    close,
                }
            })
            .collect())
    }

    async fn fetch_exchange_rate(&self, _api_key: &str, _pair: &str) -> Result<Decimal, FeedError> {
        Ok(dec!(1.08))
    }
}

fn config(keys: &[&str]) -> FeedConfig {
    FeedConfig {
        api_keys: keys.iter().map(|k| k.to_string()).collect(),
        calls_per_key: 1,
        cooldown_secs: 0,
        ..FeedConfig::default()
    }
}

#[tokio::test]
async fn test_refresh_populates_store() {
    let store = MemoryStore::with_assets([
        Asset::new("AAPL", AssetGroup::Shares, Decimal::ZERO),
        Asset::new("BTC/USD", AssetGroup::Crypto, Decimal::ZERO),
    ]);
    let feed = Arc::new(ScriptedFeed::default());
    let job = CandleRefreshJob::new(Arc::new(store.clone()), feed.clone(), config(&["k1", "k2"]), "1h");
    let (_trigger, shutdown) = shutdown_channel();

    let report = job.run_pass(Utc::now(), &shutdown).await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.skipped, 0);

    let candles = store.get_candles("BTC/USD", "1h", 10).await.unwrap();
    assert_eq!(candles.len(), 3);
    assert!(candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp));

    for asset in store.get_all_assets().await.unwrap() {
        assert_eq!(asset.current_price, dec!(102));
    }
    assert_eq!(store.get_fx_rate("EUR/USD").await.unwrap(), Some(dec!(1.08)));

    // One call per key before rotating
    let keys: Vec<String> = feed.calls.lock().unwrap().iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(keys, vec!["k1", "k2"]);
}

#[tokio::test]
async fn test_refresh_twice_does_not_duplicate_candles() {
    let store = MemoryStore::with_assets([Asset::new("AAPL", AssetGroup::Shares, Decimal::ZERO)]);
    let job = CandleRefreshJob::new(
        Arc::new(store.clone()),
        Arc::new(ScriptedFeed::default()),
        config(&["k1"]),
        "1h",
    );
    let (_trigger, shutdown) = shutdown_channel();

    job.run_pass(Utc::now(), &shutdown).await.unwrap();
    job.run_pass(Utc::now(), &shutdown).await.unwrap();

    let candles = store.get_candles("AAPL", "1h", 100).await.unwrap();
    assert_eq!(candles.len(), 3);
}

#[test]
fn test_parse_time_series_payload() {
    let body = r#"{
        "meta": {"symbol": "AAPL", "interval": "1h"},
        "values": [
            {"datetime": "2024-03-01 09:00:00", "open": "101", "high": "102", "low": "100.5", "close": "101.5"},
            {"datetime": "2024-03-01 08:00:00", "open": "100", "high": "101", "low": "99.5", "close": "101"}
        ],
        "status": "ok"
    }"#;

    let candles = parse_time_series(body, "AAPL", "NASDAQ", "1h").unwrap();
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].close, dec!(101));
    assert_eq!(candles[1].high, dec!(102));
    assert_eq!(candles[1].exchange, "NASDAQ");
}
