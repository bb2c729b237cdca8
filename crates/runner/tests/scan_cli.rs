//! Runner end-to-end tests
//!
//! A local server plays Binance spot (catalog, klines and the combined ticker
//! stream); the runner is pointed at it through its regular config file.

use axum::{
    Json, Router,
    extract::{
        Query,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use vrsi_core::{Decision, ExchangeId, SymbolId};
use vrsi_gateway::AdapterRegistry;
use vrsi_runner::{
    Args, ResultTable, RunnerConfig, StatsLine, execute_scan, load_default_config, watch_prices,
};
use vrsi_scanner::{ScanError, Scanner};

use clap::Parser;

// ============================================================================
// Mock venue
// ============================================================================

fn klines(step: i64) -> Value {
    let rows: Vec<Value> = (0..20)
        .map(|i| {
            let open_ms = 1_700_000_000_000_i64 + i * 900_000;
            let close = (1000 + step * i).to_string();
            json!([open_ms, close, close, close, close, "10", open_ms + 899_999, "0"])
        })
        .collect();
    Value::Array(rows)
}

async fn stream_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(push_tickers)
}

async fn push_tickers(mut socket: WebSocket) {
    let frame = json!({
        "stream": "btcusdt@ticker",
        "data": {"e": "24hrTicker", "s": "BTCUSDT", "c": "1030.5"}
    })
    .to_string();
    if socket.send(Message::Text(frame.into())).await.is_err() {
        return;
    }
    while let Some(Ok(msg)) = socket.recv().await {
        if let Message::Close(_) = msg {
            break;
        }
    }
}

async fn serve() -> SocketAddr {
    let app = Router::new()
        .route(
            "/api/v3/exchangeInfo",
            get(|| async {
                Json(json!({
                    "symbols": [
                        {"symbol": "BTCUSDT", "status": "TRADING", "quoteAsset": "USDT"},
                        {"symbol": "ETHUSDT", "status": "TRADING", "quoteAsset": "USDT"},
                        {"symbol": "XRPUSDT", "status": "TRADING", "quoteAsset": "USDT"},
                        {"symbol": "BNBUPUSDT", "status": "TRADING", "quoteAsset": "USDT"},
                        {"symbol": "LTCUSDT", "status": "BREAK", "quoteAsset": "USDT"}
                    ]
                }))
            }),
        )
        .route(
            "/api/v3/klines",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                match q["symbol"].as_str() {
                    "BTCUSDT" => Json(klines(2)).into_response(),
                    "ETHUSDT" => Json(klines(-3)).into_response(),
                    _ => (axum::http::StatusCode::BAD_REQUEST, "invalid symbol").into_response(),
                }
            }),
        )
        .route("/stream", get(stream_handler));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn config_for(addr: SocketAddr, argv: &[&str]) -> RunnerConfig {
    let mut config = load_default_config().unwrap();
    for exchange in &mut config.gateway.exchanges {
        if exchange.id == ExchangeId::Binance {
            *exchange = exchange
                .clone()
                .with_base_urls(format!("http://{}", addr), format!("ws://{}", addr));
        }
    }
    config.scan.inter_batch_delay_ms = 0;

    let args = Args::try_parse_from(argv).unwrap();
    args.apply(&mut config);
    config.validate().unwrap();
    config
}

fn scanner_for(config: &RunnerConfig) -> (AdapterRegistry, Scanner) {
    let registry = AdapterRegistry::from_config(config.gateway.clone()).unwrap();
    let adapter = registry.get(config.scan.exchange).unwrap();
    (registry, Scanner::new().with_adapter(adapter))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_scan_prints_ranked_table() {
    let addr = serve().await;
    let config = config_for(addr, &["vrsi"]);
    let (_registry, scanner) = scanner_for(&config);

    let report = execute_scan(&scanner, config.scan.clone(), std::future::pending())
        .await
        .unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.failures.candle_fetch, 1);
    assert_eq!(report.results[&SymbolId::new("BTCUSDT")].decision, Decision::Long);
    assert_eq!(report.results[&SymbolId::new("ETHUSDT")].decision, Decision::Short);
    assert_eq!(report.results[&SymbolId::new("BTCUSDT")].last_price, dec!(1038));

    let table = ResultTable::new(&report).to_string();
    assert!(table.contains("BTCUSDT"));
    assert!(table.contains("ETHUSDT"));
    assert!(!table.contains("BNBUPUSDT"));

    let stats = StatsLine(&report).to_string();
    assert!(stats.contains("scanned 3/3"));
    assert!(stats.contains("LONG 1 | SHORT 1 | NEUTRAL 0"));
}

#[tokio::test]
async fn test_explicit_symbols_and_filter() {
    let addr = serve().await;
    let config = config_for(addr, &["vrsi", "--symbols", "eth", "--filter", "long"]);
    let (_registry, scanner) = scanner_for(&config);

    let report = execute_scan(&scanner, config.scan.clone(), std::future::pending())
        .await
        .unwrap();
    assert_eq!(report.universe, vec![SymbolId::new("ETHUSDT")]);

    let args = Args::try_parse_from(["vrsi", "--filter", "long"]).unwrap();
    let table = ResultTable::new(&report).with_filter(args.decision_filter());
    assert!(table.rows().is_empty());
}

#[tokio::test]
async fn test_interrupt_cancels_scan() {
    let addr = serve().await;
    let config = config_for(addr, &["vrsi"]);
    let (_registry, scanner) = scanner_for(&config);

    let report = execute_scan(&scanner, config.scan.clone(), async {})
        .await
        .unwrap();
    assert!(report.is_cancelled());
    assert!(report.results.is_empty());
    assert_eq!(report.completed, 0);
}

#[tokio::test]
async fn test_empty_favorites_is_empty_universe() {
    let addr = serve().await;
    let config = config_for(addr, &["vrsi", "--favorites", " , "]);
    let (_registry, scanner) = scanner_for(&config);

    let err = execute_scan(&scanner, config.scan.clone(), std::future::pending())
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::EmptyUniverse { .. }));
}

#[test]
fn test_binary_exits_non_zero_on_empty_universe() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_vrsi"))
        .args(["--favorites", " , "])
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No symbols to scan on"), "stderr: {}", stderr);
}

#[tokio::test]
async fn test_live_overlay_receives_prices() {
    let addr = serve().await;
    let config = config_for(addr, &["vrsi"]);
    let (registry, _scanner) = scanner_for(&config);

    let board = watch_prices(
        registry.get(ExchangeId::Binance).unwrap(),
        &[SymbolId::new("BTCUSDT")],
        config.scan.market,
        config.gateway.stream.clone(),
        Duration::from_millis(500),
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(board.price(&SymbolId::new("BTCUSDT")), Some(dec!(1030.5)));
}
