//! Zones preview command

use crate::config::Config;
use crate::feed::{FeedError, HttpCandleFeed, MarketDataFeed};
use crate::market::to_f64;
use crate::model::{probability_to_odds, GbmReachModel};
use crate::zones::{plan_asset_zones, PlannedZoneSet, ZoneGenerator};
use clap::Args;
use chrono::Utc;

#[derive(Args, Debug)]
pub struct ZonesArgs {
    /// Ticker to fetch, e.g. "AAPL" or "BTC/USD"
    #[arg(short, long)]
    pub ticker: String,
}

fn print_sets(ticker: &str, price: f64, sets: &[PlannedZoneSet], house_margin: f64) {
    println!("{} @ {:.4}", ticker, price);
    for set in sets {
        println!(
            "  {}h period {} [{} .. {}]",
            set.timeframe_hours,
            set.window.index,
            set.window.start.format("%Y-%m-%d %H:%M"),
            set.window.end.format("%Y-%m-%d %H:%M"),
        );
        for zone in &set.zones {
            println!(
                "    {:>9} {:>12.4} ±{:>6.3}%  p={:.3}  odds={:.2}",
                format!("{:?}", zone.kind),
                zone.target,
                zone.margin_percent() / 2.0,
                zone.probability,
                probability_to_odds(zone.probability, house_margin),
            );
        }
    }
}

impl ZonesArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let api_key = config.feed.api_keys.first().ok_or(FeedError::NoApiKeys)?;
        let feed = HttpCandleFeed::new(&config.feed)?;
        let candles = feed
            .fetch_candles(
                api_key,
                &self.ticker,
                &config.generation.candle_interval,
                config.generation.history_candles,
            )
            .await?;

        let Some(last) = candles.last() else {
            anyhow::bail!("No candles returned for {}", self.ticker);
        };
        let price = to_f64(last.close);

        let generation = &config.generation;
        let generator = ZoneGenerator::new(GbmReachModel::new(), generation.gap_pct);
        let sets = plan_asset_zones(generation, &generator, price, &candles, Utc::now())?;
        print_sets(&self.ticker, price, &sets, generation.house_margin);

        Ok(())
    }
}
