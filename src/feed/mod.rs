//! Market-data feed
//!
//! Hourly candles and the EUR exchange rate over HTTP, with API keys
//! rotated through an immutable [`KeyRotation`] value.

mod http;
mod refresh;
mod rotation;
mod types;

pub use http::HttpCandleFeed;
pub use refresh::CandleRefreshJob;
pub use rotation::{KeyRotation, RotationStep};
pub use types::{parse_exchange_rate, parse_time_series};

use crate::market::Candle;
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// Default market-data API
pub const DEFAULT_BASE_URL: &str = "https://api.twelvedata.com";

/// Market-data fetch errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// Non-success status, either HTTP or reported in the payload
    #[error("Feed returned {status}: {body}")]
    Http { status: u16, body: String },
    /// Transport failure
    #[error("Feed request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Payload could not be understood
    #[error("Malformed feed payload: {0}")]
    Malformed(String),
    /// No API key configured
    #[error("No API keys configured")]
    NoApiKeys,
}

/// Trait for market-data implementations
///
/// The API key is chosen by the caller so that rotation state stays out of
/// the feed.
#[async_trait]
pub trait MarketDataFeed: Send + Sync {
    /// Latest `count` candles of `symbol`, oldest first
    async fn fetch_candles(
        &self,
        api_key: &str,
        symbol: &str,
        interval: &str,
        count: usize,
    ) -> Result<Vec<Candle>, FeedError>;

    /// Rate of `pair`, e.g. quote-currency units per EUR for "EUR/USD"
    async fn fetch_exchange_rate(&self, api_key: &str, pair: &str) -> Result<Decimal, FeedError>;
}
