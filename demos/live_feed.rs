//! Live feed demo - streams real-time depth data into a ring-buffer book
//!
//! Usage:
//!   cargo run --example live_feed
//!
//! Optional:
//!   KUCOIN_SYMBOL=ETH-USDT    # Symbol to stream (default: BTC-USDT)
//!   KUCOIN_MARKET=futures     # Market (default: spot)
//!   KUCOIN_PEG=3000           # Peg price near the current price (default: 100000)

use std::sync::Arc;
use std::time::Duration;

use kucoin_l2::client::{ReconnectConfig, ReconnectingWebSocket, RestClient};
use kucoin_l2::config::{Config, Market};
use kucoin_l2::orderbook::BookManager;
use kucoin_l2::types::Instrument;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kucoin_l2=info".parse().unwrap()),
        )
        .init();

    let symbol = std::env::var("KUCOIN_SYMBOL").unwrap_or_else(|_| "BTC-USDT".to_string());
    let market = match std::env::var("KUCOIN_MARKET")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "futures" => Market::Futures,
        _ => Market::Spot,
    };
    let peg: f64 = std::env::var("KUCOIN_PEG")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(100_000.0);

    println!("=== KuCoin L2 Live Feed ===\n");

    let config = Config::new(market).with_book_depth(5);
    let instrument = Instrument::new(&symbol, market, 2, 8, 0.01, peg)?;
    let topic = instrument.topic();

    let manager = Arc::new(BookManager::new(config.clone()));
    manager.add_instrument(instrument)?;

    println!("Connecting to {market:?} feed...");
    let rest = RestClient::new(&config)?;
    let mut ws = ReconnectingWebSocket::connect(rest, ReconnectConfig::default()).await?;
    println!("Connected!\n");

    println!("Subscribing to {topic}...");
    ws.subscribe(&topic).await?;

    let ping_every = ws.ping_interval().unwrap_or(Duration::from_secs(18));
    let mut ping_timer = tokio::time::interval(ping_every);
    ping_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    println!("=== Streaming Live Data ===");
    println!("(Press Ctrl+C to stop)\n");

    let mut message_count = 0u64;
    let start_time = std::time::Instant::now();

    loop {
        tokio::select! {
            _ = ping_timer.tick() => {
                if let Err(e) = ws.ping().await {
                    println!("[ERROR] ping failed: {e}");
                }
            }
            msg = ws.next() => {
                let Some(msg) = msg else {
                    break;
                };
                match msg {
                    Ok(msg) => {
                        message_count += 1;
                        if let Some(updated) = manager.process_message(&msg) {
                            print_book_summary(&manager, &updated);
                        }

                        if message_count % 50 == 0 {
                            let elapsed = start_time.elapsed().as_secs_f64();
                            println!(
                                "\n--- {} messages in {:.1}s ({:.1} msg/s) ---\n",
                                message_count,
                                elapsed,
                                message_count as f64 / elapsed
                            );
                        }
                    }
                    Err(e) => {
                        println!("[ERROR] WebSocket error: {e}");
                    }
                }
            }
        }
    }

    println!("\nWebSocket closed");
    Ok(())
}

fn print_book_summary(manager: &BookManager, symbol: &str) {
    let Some(book) = manager.book(symbol) else {
        return;
    };
    let bid = book.best_bid().map(|p| book.instrument().scaled_to_price(p));
    let ask = book.best_ask().map(|p| book.instrument().scaled_to_price(p));
    let bid_qty = book
        .instrument()
        .scaled_to_qty(book.best_bid_qty());
    let ask_qty = book
        .instrument()
        .scaled_to_qty(book.best_ask_qty());

    println!(
        "{symbol} | BID: {bid_qty} @ {bid:?} | ASK: {ask_qty} @ {ask:?} | mid: {:?} | seq: {}",
        book.mid_price(),
        book.last_sequence_end()
    );
}
