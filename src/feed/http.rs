//! HTTP market-data client

use super::{parse_exchange_rate, parse_time_series, FeedError, MarketDataFeed};
use crate::config::FeedConfig;
use crate::market::Candle;
use crate::telemetry::{incr_counter, record_latency, CounterMetric, LatencyMetric};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use std::time::{Duration, Instant};

/// Client for a TwelveData-style REST API
pub struct HttpCandleFeed {
    base_url: String,
    exchange: String,
    client: Client,
}

impl HttpCandleFeed {
    /// Create a client from feed configuration
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            exchange: config.exchange.clone(),
            client,
        })
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, FeedError> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(url = %url, "Fetching from market-data API");

        let started = Instant::now();
        let response = self.client.get(&url).query(query).send().await;
        record_latency(LatencyMetric::FeedRequest, started.elapsed());
        incr_counter(CounterMetric::FeedCalls, 1);
        let response = response?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Http { status, body });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl MarketDataFeed for HttpCandleFeed {
    async fn fetch_candles(
        &self,
        api_key: &str,
        symbol: &str,
        interval: &str,
        count: usize,
    ) -> Result<Vec<Candle>, FeedError> {
        let outputsize = count.to_string();
        let body = self
            .get(
                "time_series",
                &[
                    ("symbol", symbol),
                    ("interval", interval),
                    ("outputsize", &outputsize),
                    ("timezone", "UTC"),
                    ("apikey", api_key),
                ],
            )
            .await?;

        parse_time_series(&body, symbol, &self.exchange, interval)
    }

    async fn fetch_exchange_rate(&self, api_key: &str, pair: &str) -> Result<Decimal, FeedError> {
        let body = self
            .get("exchange_rate", &[("symbol", pair), ("apikey", api_key)])
            .await?;
        parse_exchange_rate(&body)
    }
}
