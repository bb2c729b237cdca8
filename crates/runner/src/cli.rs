//! Command-line arguments and how they override the config file

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use vrsi_core::{Decision, ExchangeId, Interval, Market, SymbolId, parse_symbol_list};
use vrsi_scanner::SymbolSelection;

use crate::config::RunnerConfig;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "vrsi")]
#[command(about = "Volume-weighted RSI scanner for Binance, Bybit, OKX and MEXC")]
#[command(version)]
pub struct Args {
    /// Path to a JSON configuration file (embedded defaults otherwise)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Exchange to scan (binance, bybit, okx, mexc)
    #[arg(short, long)]
    pub exchange: Option<ExchangeId>,

    /// Market to scan (spot, futures)
    #[arg(short, long)]
    pub market: Option<Market>,

    /// Candle interval (5m, 15m, 30m, 1h, 4h, 1d, 1w)
    #[arg(short, long)]
    pub interval: Option<Interval>,

    /// Number of close-to-close moves in the index window
    #[arg(long)]
    pub period: Option<usize>,

    /// Slope of the signal normalization
    #[arg(long)]
    pub steepness: Option<f64>,

    /// Signal magnitude above which LONG / SHORT is called
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Comma-separated base assets to scan instead of the full listing ("btc,eth,sol")
    #[arg(long, conflicts_with = "favorites")]
    pub symbols: Option<String>,

    /// Comma-separated saved favorites ("BTCUSDT,ETHUSDT")
    #[arg(long)]
    pub favorites: Option<String>,

    /// Only print results with this decision
    #[arg(long)]
    pub filter: Option<DecisionFilter>,

    /// Print at most this many rows
    #[arg(long)]
    pub top: Option<usize>,

    /// Print the rolling index of one symbol after the table
    #[arg(long)]
    pub detail: Option<String>,

    /// Stream live prices for the printed symbols for this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub live: Option<u64>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionFilter {
    Long,
    Short,
    Neutral,
}

impl From<DecisionFilter> for Decision {
    fn from(filter: DecisionFilter) -> Self {
        match filter {
            DecisionFilter::Long => Decision::Long,
            DecisionFilter::Short => Decision::Short,
            DecisionFilter::Neutral => Decision::Neutral,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut RunnerConfig) {
        let scan = &mut config.scan;
        if let Some(exchange) = self.exchange {
            scan.exchange = exchange;
        }
        if let Some(market) = self.market {
            scan.market = market;
        }
        if let Some(interval) = self.interval {
            scan.interval = interval;
        }
        if let Some(period) = self.period {
            scan.period = period;
        }
        if let Some(steepness) = self.steepness {
            scan.steepness = steepness;
        }
        if let Some(threshold) = self.threshold {
            scan.threshold = threshold;
        }
        if let Some(list) = &self.symbols {
            scan.selection = SymbolSelection::Explicit(parse_symbol_list(list));
        } else if let Some(list) = &self.favorites {
            scan.selection = SymbolSelection::Favorites(parse_symbol_list(list));
        }
    }

    pub fn decision_filter(&self) -> Option<Decision> {
        self.filter.map(Decision::from)
    }

    pub fn detail_symbol(&self) -> Option<SymbolId> {
        self.detail
            .as_deref()
            .and_then(|s| parse_symbol_list(s).into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_default_config;

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "vrsi",
            "--exchange",
            "bybit",
            "--market",
            "futures",
            "--interval",
            "1h",
            "--period",
            "21",
            "--threshold",
            "0.4",
            "--symbols",
            "btc, eth",
        ])
        .unwrap();
        let mut config = load_default_config().unwrap();
        args.apply(&mut config);

        assert_eq!(config.scan.exchange, ExchangeId::Bybit);
        assert_eq!(config.scan.market, Market::Derivatives);
        assert_eq!(config.scan.interval, Interval::H1);
        assert_eq!(config.scan.period, 21);
        assert_eq!(config.scan.threshold, 0.4);
        assert_eq!(config.scan.steepness, 0.12);
        assert_eq!(
            config.scan.selection,
            SymbolSelection::Explicit(vec![SymbolId::new("BTCUSDT"), SymbolId::new("ETHUSDT")])
        );
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let args = Args::try_parse_from(["vrsi"]).unwrap();
        let mut config = load_default_config().unwrap();
        let before = config.scan.clone();
        args.apply(&mut config);
        assert_eq!(config.scan, before);
        assert_eq!(args.log_format, LogFormat::Text);
    }

    #[test]
    fn test_favorites_and_filter() {
        let args = Args::try_parse_from([
            "vrsi",
            "--favorites",
            "BTCUSDT,SOLUSDT",
            "--filter",
            "short",
            "--top",
            "5",
        ])
        .unwrap();
        let mut config = load_default_config().unwrap();
        args.apply(&mut config);

        assert!(matches!(config.scan.selection, SymbolSelection::Favorites(ref l) if l.len() == 2));
        assert_eq!(args.decision_filter(), Some(Decision::Short));
        assert_eq!(args.top, Some(5));
    }

    #[test]
    fn test_symbols_conflict_with_favorites() {
        let parsed = Args::try_parse_from(["vrsi", "--symbols", "btc", "--favorites", "ETHUSDT"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_rejects_unknown_exchange() {
        assert!(Args::try_parse_from(["vrsi", "--exchange", "kraken"]).is_err());
    }

    #[test]
    fn test_detail_symbol() {
        let args = Args::try_parse_from(["vrsi", "--detail", "sol"]).unwrap();
        assert_eq!(args.detail_symbol(), Some(SymbolId::new("SOLUSDT")));
        let args = Args::try_parse_from(["vrsi", "--detail", "ethusdt"]).unwrap();
        assert_eq!(args.detail_symbol(), Some(SymbolId::new("ETHUSDT")));
    }
}
