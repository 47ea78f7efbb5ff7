//! Integration tests for the live WebSocket feed.
//!
//! These tests hit KuCoin's public feed. No credentials are needed, but
//! they are skipped by default so offline `cargo test` runs stay green.
//!
//! # Running
//!
//! ```bash
//! KUCOIN_LIVE_TESTS=1 cargo test --test integration_websocket
//! ```

use std::time::Duration;

use kucoin_l2::client::{RestClient, WebSocketClient};
use kucoin_l2::config::{Config, Market};
use kucoin_l2::orderbook::BookManager;
use kucoin_l2::types::messages::WsMessage;
use kucoin_l2::types::Instrument;

const FEED_TIMEOUT: Duration = Duration::from_secs(30);

/// Skip test unless live testing is opted into
macro_rules! require_live {
    () => {
        if std::env::var("KUCOIN_LIVE_TESTS").is_err() {
            eprintln!("Skipping test: KUCOIN_LIVE_TESTS not set");
            return;
        }
    };
}

async fn connect(market: Market) -> WebSocketClient {
    let rest = RestClient::new(&Config::new(market)).unwrap();
    let token = rest.fetch_token().await.unwrap();
    WebSocketClient::connect(&token).await.unwrap()
}

#[tokio::test]
async fn test_welcome_and_ack() {
    require_live!();

    let mut ws = connect(Market::Spot).await;

    let first = tokio::time::timeout(FEED_TIMEOUT, ws.next())
        .await
        .expect("timed out waiting for welcome")
        .unwrap()
        .unwrap();
    assert!(matches!(first, WsMessage::Welcome { .. }));

    ws.subscribe("/spotMarket/level2Depth5:BTC-USDT")
        .await
        .unwrap();

    // The ack arrives before any feed data for the topic.
    loop {
        let msg = tokio::time::timeout(FEED_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for ack")
            .unwrap()
            .unwrap();
        match msg {
            WsMessage::Ack { .. } => break,
            WsMessage::Error { code, data, .. } => {
                panic!("subscribe rejected: {code:?} {data:?}")
            }
            _ => continue,
        }
    }

    ws.close().await.unwrap();
}

#[tokio::test]
async fn test_book_initializes_from_feed() {
    require_live!();

    let config = Config::new(Market::Spot)
        .with_book_depth(5)
        .with_book_capacity(5_000);
    let manager = BookManager::new(config);
    let btc = Instrument::new("BTC-USDT", Market::Spot, 2, 8, 0.01, 100_000.0).unwrap();
    let topic = btc.topic();
    manager.add_instrument(btc).unwrap();

    let mut ws = connect(Market::Spot).await;
    ws.subscribe(&topic).await.unwrap();

    let deadline = tokio::time::Instant::now() + FEED_TIMEOUT;
    let mut updates = 0;
    while tokio::time::Instant::now() < deadline && updates < 5 {
        let msg = match tokio::time::timeout_at(deadline, ws.next()).await {
            Ok(Some(Ok(msg))) => msg,
            Ok(Some(Err(e))) => panic!("feed error: {e}"),
            _ => break,
        };
        if manager.process_message(&msg).is_some() {
            updates += 1;
        }
    }
    assert!(updates > 0, "no book updates received within the deadline");

    let book = manager.book("BTC-USDT").unwrap();
    let bid = book.best_bid().expect("no best bid after live updates");
    let ask = book.best_ask().expect("no best ask after live updates");
    assert!(bid < ask, "crossed book: bid {bid} >= ask {ask}");
    println!(
        "BTC-USDT mid after {updates} updates: {:?}",
        book.mid_price()
    );

    ws.close().await.unwrap();
}

#[tokio::test]
async fn test_ping_pong() {
    require_live!();

    let mut ws = connect(Market::Spot).await;
    ws.ping().await.unwrap();

    loop {
        let msg = tokio::time::timeout(FEED_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for pong")
            .unwrap()
            .unwrap();
        match msg {
            WsMessage::Pong { .. } => break,
            _ => continue,
        }
    }

    ws.close().await.unwrap();
}
