//! zone-odds: price-zone wagering engine
//!
//! This library provides the core components for:
//! - Technical indicators over hourly candles
//! - A GBM reach model with side-aware drift
//! - Touching, non-overlapping zone generation per timeframe and period
//! - Volume-driven odds rebalancing with period decay
//! - Exit-based wager settlement and payout
//! - Candle refresh from a rate-limited HTTP feed
//! - Guarded interval scheduling with graceful shutdown
//! - Logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod feed;
pub mod indicators;
pub mod market;
pub mod model;
pub mod rebalance;
pub mod scheduler;
pub mod settlement;
pub mod store;
pub mod telemetry;
pub mod zones;
