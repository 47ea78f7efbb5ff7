//! # kucoin-l2
//!
//! A live level-2 depth feed for [KuCoin](https://www.kucoin.com) spot and
//! futures markets, maintained in fixed-capacity ring-buffer order books.
//!
//! ## Features
//!
//! - **Ring-Buffer Orderbook** - Both sides in one price-indexed array,
//!   O(1) updates, no allocation on the hot path
//! - **Sequence Reconciliation** - Out-of-order deltas cached and replayed
//!   in arrival order, gapped windows dropped
//! - **Resilient Transport** - Token handshake, topic replay, and
//!   exponential-backoff reconnection
//! - **Async/Await** - Built on Tokio
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kucoin_l2::config::{Config, Market};
//! use kucoin_l2::client::{ReconnectConfig, ReconnectingWebSocket, RestClient};
//! use kucoin_l2::orderbook::BookManager;
//! use kucoin_l2::types::Instrument;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), kucoin_l2::Error> {
//!     let config = Config::new(Market::Spot);
//!     let btc = Instrument::new("BTC-USDT", Market::Spot, 2, 8, 0.01, 100_000.0)?;
//!     let topic = btc.topic();
//!
//!     let manager = Arc::new(BookManager::new(config.clone()));
//!     manager.add_instrument(btc)?;
//!
//!     let rest = RestClient::new(&config)?;
//!     let mut ws = ReconnectingWebSocket::connect(rest, ReconnectConfig::default()).await?;
//!     ws.subscribe(&topic).await?;
//!
//!     while let Some(msg) = ws.next().await {
//!         if let Some(symbol) = manager.process_message(&msg?) {
//!             if let Some(mid) = manager.mid_price(&symbol) {
//!                 println!("{symbol} mid: {mid}");
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Price Representation
//!
//! Book arithmetic runs on **scaled integers**: a decimal price or
//! quantity multiplied by `10^scale` and rounded, per instrument. A
//! BTC-USDT price of `100000.01` with a price scale of 2 is stored as
//! `10000001`. Conversions live on [`types::Instrument`].
//!
//! ## Architecture
//!
//! This crate is organized into several modules:
//!
//! - [`client`] - REST token handshake and WebSocket feed clients
//! - [`types`] - Instruments, sides, and wire message types
//! - [`orderbook`] - Ring-buffer book, update cache, and book manager
//! - [`config`] - Market selection and sizing knobs
//! - [`error`] - Error types for the crate
//!
//! ## Performance
//!
//! The book hot path is branch-light and allocation-free:
//!
//! - Integer prices (scaled units) instead of floating point
//! - One contiguous slot array for both sides, indexed by price
//! - `FxHashMap` for faster hashing of small keys
//! - `parking_lot` locks (faster than std)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod orderbook;
pub mod types;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use error::Error;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// The main KuCoin feed client
///
/// Bundles the configuration with a REST client and hands out feed
/// connections.
///
/// # Example
///
/// ```rust,no_run
/// use kucoin_l2::config::{Config, Market};
/// use kucoin_l2::KucoinClient;
///
/// # async fn example() -> kucoin_l2::Result<()> {
/// let client = KucoinClient::new(Config::new(Market::Spot))?;
///
/// let mut ws = client.websocket().await?;
/// ws.subscribe("/spotMarket/level2Depth5:BTC-USDT").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct KucoinClient {
    config: Config,
    rest_client: client::rest::RestClient,
}

impl KucoinClient {
    /// Create a new client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: Config) -> Result<Self> {
        let rest_client = client::rest::RestClient::new(&config)?;
        Ok(Self {
            config,
            rest_client,
        })
    }

    /// Get a reference to the REST client
    pub fn rest(&self) -> &client::rest::RestClient {
        &self.rest_client
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Connect a plain WebSocket client (no reconnection)
    pub async fn websocket(&self) -> Result<client::websocket::WebSocketClient> {
        let token = self.rest_client.fetch_token().await?;
        client::websocket::WebSocketClient::connect(&token).await
    }

    /// Connect a reconnecting WebSocket client
    ///
    /// Builds its own REST client so token re-acquisition does not
    /// borrow from `self`.
    pub async fn reconnecting_websocket(
        &self,
        reconnect_config: client::websocket::ReconnectConfig,
    ) -> Result<client::websocket::ReconnectingWebSocket> {
        let rest = client::rest::RestClient::new(&self.config)?;
        client::websocket::ReconnectingWebSocket::connect(rest, reconnect_config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Market;

    #[test]
    fn test_client_creation() {
        let client = KucoinClient::new(Config::new(Market::Spot)).unwrap();
        assert_eq!(client.rest().base_url(), "https://api.kucoin.com");
        assert_eq!(client.config().market(), Market::Spot);
    }
}
