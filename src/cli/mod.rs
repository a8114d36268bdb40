//! CLI interface for zone-odds
//!
//! Provides subcommands for:
//! - `run`: Start the scheduled jobs
//! - `zones`: Preview the zones one asset would get
//! - `config`: Show the effective configuration

mod run;
mod zones;

pub use run::RunArgs;
pub use zones::ZonesArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "zone-odds")]
#[command(about = "Price-zone generation, odds rebalancing and wager settlement")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start candle refresh, zone generation, rebalancing and settlement
    Run(RunArgs),
    /// Fetch candles once and print the zones that would be generated
    Zones(ZonesArgs),
    /// Show effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_zones_command() {
        let cli = Cli::parse_from(["zone-odds", "-c", "custom.toml", "zones", "--ticker", "AAPL"]);
        assert_eq!(cli.config, "custom.toml");
        match cli.command {
            Commands::Zones(args) => assert_eq!(args.ticker, "AAPL"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_run_once() {
        let cli = Cli::parse_from(["zone-odds", "run", "--once"]);
        assert!(matches!(cli.command, Commands::Run(RunArgs { once: true })));
        assert_eq!(cli.config, "config.toml");
    }
}
