use anyhow::Context;
use clap::Parser;
use std::time::Duration;
use vrsi_core::SymbolId;
use vrsi_gateway::AdapterRegistry;
use vrsi_runner::{
    Args, IndexSeriesView, LiveOverlay, ResultTable, StatsLine, execute_scan, init_logging,
    load_config, load_default_config, watch_prices,
};
use vrsi_scanner::Scanner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_format)?;

    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path).with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => load_default_config()?,
    };
    args.apply(&mut config);
    config.validate()?;

    let registry = AdapterRegistry::from_config(config.gateway.clone())?;
    let adapter = registry.get(config.scan.exchange)?;
    let scanner = Scanner::new().with_adapter(adapter.clone());

    // An empty universe is a failure: reported on stderr with a non-zero exit
    let report = execute_scan(&scanner, config.scan.clone(), interrupted()).await?;

    let table = ResultTable::new(&report)
        .with_filter(args.decision_filter())
        .with_top(args.top);
    println!("{}", table);
    println!("{}", StatsLine(&report));

    if let Some(symbol) = args.detail_symbol() {
        match report.results.get(&symbol) {
            Some(result) => println!("\n{}", IndexSeriesView::new(result, config.scan.period)),
            None => println!("\nNo result for {}", symbol),
        }
    }

    if let Some(seconds) = args.live.filter(|_| !report.is_cancelled()) {
        let rows = table.rows();
        let symbols: Vec<SymbolId> = rows.iter().map(|r| r.symbol.clone()).collect();
        let board = watch_prices(
            adapter,
            &symbols,
            config.scan.market,
            config.gateway.stream.clone(),
            Duration::from_secs(seconds),
            interrupted(),
        )
        .await?;
        println!("\n{}", LiveOverlay::new(&rows, &board));
    }

    Ok(())
}

/// Resolves on Ctrl-C; never if the signal handler cannot be installed
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
