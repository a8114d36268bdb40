//! Feed payloads
//!
//! Time-series and exchange-rate responses. Errors are reported in-band
//! with `"status": "error"` and a numeric `code`.

use super::FeedError;
use crate::market::Candle;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    values: Option<Vec<TimeSeriesValue>>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
}

#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    rate: Option<Decimal>,
}

fn api_error(code: Option<u16>, message: Option<String>) -> FeedError {
    FeedError::Http {
        status: code.unwrap_or(500),
        body: message.unwrap_or_default(),
    }
}

fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, FeedError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| FeedError::Malformed(format!("bad datetime {raw:?}")))
}

/// Parse a time-series body into candles, oldest first
pub fn parse_time_series(
    body: &str,
    asset_id: &str,
    exchange: &str,
    interval: &str,
) -> Result<Vec<Candle>, FeedError> {
    let response: TimeSeriesResponse =
        serde_json::from_str(body).map_err(|e| FeedError::Malformed(e.to_string()))?;

    if response.status.as_deref() == Some("error") {
        return Err(api_error(response.code, response.message));
    }

    let values = response
        .values
        .ok_or_else(|| FeedError::Malformed("missing values".to_string()))?;

    let mut candles = values
        .into_iter()
        .map(|v| {
            if v.high < v.low {
                return Err(FeedError::Malformed(format!(
                    "high below low at {}",
                    v.datetime
                )));
            }
            Ok(Candle {
                asset_id: asset_id.to_string(),
                exchange: exchange.to_string(),
                interval: interval.to_string(),
                timestamp: parse_datetime(&v.datetime)?,
                open: v.open,
                high: v.high,
                low: v.low,
                close: v.close,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Newest first on the wire
    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

/// Parse an exchange-rate body
pub fn parse_exchange_rate(body: &str) -> Result<Decimal, FeedError> {
    let response: ExchangeRateResponse =
        serde_json::from_str(body).map_err(|e| FeedError::Malformed(e.to_string()))?;

    if response.status.as_deref() == Some("error") {
        return Err(api_error(response.code, response.message));
    }

    match response.rate {
        Some(rate) if rate > Decimal::ZERO => Ok(rate),
        Some(rate) => Err(FeedError::Malformed(format!("non-positive rate {rate}"))),
        None => Err(FeedError::Malformed("missing rate".to_string())),
    }
}
