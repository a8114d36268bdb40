//! Integration tests for zone and wager domain rules

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;
use zone_odds::config::{PolicyKind, RebalanceConfig};
use zone_odds::market::{Asset, AssetGroup, Candle, Currency, Wager, WagerState, WagerStatus, Zone, ZoneKind};
use zone_odds::rebalance::{decay_factor, RebalancePolicy};
use zone_odds::settlement::find_breach;

fn zone(target: Decimal, hours: u32) -> Zone {
    let now = Utc::now();
    Zone {
        id: Uuid::new_v4(),
        ticker: "BTC/USD".to_string(),
        target_price: target,
        margin_percent: dec!(4),
        start_time: now,
        end_time: now + Duration::hours(i64::from(hours)),
        target_odds: dec!(2),
        kind: ZoneKind::Above,
        timeframe_hours: hours,
        active: true,
        currency: Currency::Usd,
        created_at: now,
    }
}

#[test]
fn test_zone_bounds_use_full_band_width() {
    let z = zone(dec!(50000), 1);
    assert_eq!(z.upper_bound(), dec!(51000));
    assert_eq!(z.lower_bound(), dec!(49000));
    assert_eq!(z.direction(dec!(48000)), 1);
    assert_eq!(z.direction(dec!(52000)), -1);
    assert_eq!(z.direction(dec!(50000)), 0);
}

#[test]
fn test_breach_on_exit_only() {
    let z = zone(dec!(50000), 1);
    let bar = |high: Decimal, low: Decimal| Candle {
        asset_id: "BTC/USD".to_string(),
        exchange: "test".to_string(),
        interval: "1h".to_string(),
        timestamp: Utc::now(),
        open: low,
        high,
        low,
        close: high,
    };
    assert!(find_breach(&z, &[bar(dec!(51000), dec!(49000))], Decimal::ONE).is_none());
    assert!(find_breach(&z, &[bar(dec!(51000.01), dec!(49000))], Decimal::ONE).is_some());
}

#[test]
fn test_wager_lifecycle_states() {
    let mut w = Wager::new(Uuid::new_v4(), "BTC/USD", Uuid::new_v4(), Currency::Eur, dec!(10), dec!(50000), dec!(2.5));
    assert_eq!(w.state(), WagerState::Active);
    assert!(!w.awaiting_payout());

    w.status = WagerStatus::Won;
    assert_eq!(w.state(), WagerState::Won);
    w.finished = true;
    assert!(w.awaiting_payout());
    assert_eq!(w.payout(), dec!(25.0));
    w.paid = true;
    assert_eq!(w.state(), WagerState::Paid);
    assert!(!w.awaiting_payout());
}

#[test]
fn test_max_odd_tracks_shortest_timeframe() {
    let mut asset = Asset::new("BTC/USD", AssetGroup::Crypto, dec!(50000));
    let mut hourly = zone(dec!(53000), 1);
    hourly.target_odds = dec!(4.2);
    let mut daily = zone(dec!(60000), 24);
    daily.target_odds = dec!(9.9);

    assert!(asset.refresh_max_odd(&[hourly, daily]));
    assert_eq!(asset.max_odd, Some(dec!(4.2)));
    assert_eq!(asset.max_odd_direction, Some(1));
}

#[test]
fn test_policies_are_selected_not_blended() {
    let laplace = RebalancePolicy::from_config(&RebalanceConfig::default());
    let inverse = RebalancePolicy::from_config(&RebalanceConfig {
        policy: PolicyKind::InverseShare,
        ..RebalanceConfig::default()
    });
    assert_eq!(laplace.odds(&[30.0, 70.0], 1.0), vec![3.22, 1.41]);
    assert_eq!(inverse.odds(&[30.0, 70.0], 1.0), vec![2.31, 1.1]);
}

#[test]
fn test_decay_reaches_floor() {
    assert_eq!(decay_factor(0, 3, 0.4, 0.6), 1.0);
    assert!((decay_factor(1, 3, 0.4, 0.6) - 0.8).abs() < 1e-12);
    assert_eq!(decay_factor(2, 3, 0.8, 0.6), 0.6);
    assert_eq!(decay_factor(5, 1, 0.4, 0.6), 1.0);
}
