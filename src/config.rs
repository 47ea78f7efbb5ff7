//! Configuration for the KuCoin market-data client.
//!
//! This module provides the [`Market`] selector for the spot vs futures
//! feeds and the [`Config`] struct for client and book settings.

use std::time::Duration;

/// Which KuCoin feed an instrument trades on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Market {
    /// Spot / margin market
    #[default]
    Spot,
    /// Perpetual futures market
    Futures,
}

impl Market {
    /// Base URL of the REST API serving the bullet-public token endpoint
    pub fn rest_base_url(&self) -> &'static str {
        match self {
            Market::Spot => "https://api.kucoin.com",
            Market::Futures => "https://api-futures.kucoin.com",
        }
    }

    /// Topic prefix for depth-limited level-2 subscriptions
    pub fn topic_prefix(&self) -> &'static str {
        match self {
            Market::Spot => "/spotMarket/level2Depth5",
            Market::Futures => "/contractMarket/level2Depth5",
        }
    }
}

/// Configuration for the market-data client
///
/// # Example
///
/// ```rust
/// use kucoin_l2::Config;
/// use kucoin_l2::config::Market;
///
/// let config = Config::new(Market::Spot)
///     .with_timeout(std::time::Duration::from_secs(30))
///     .with_book_depth(20)
///     .with_book_capacity(100);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Which feed to connect to
    market: Market,

    /// HTTP request timeout
    timeout: Duration,

    /// Ticks tracked away from best price on each book side
    book_depth: usize,

    /// Total ring-buffer slots per book
    book_capacity: usize,

    /// Maximum pending updates buffered per book before the oldest is dropped
    cache_capacity: usize,
}

impl Config {
    /// Create a configuration with defaults matching the reference deployment:
    /// 10 ticks of depth over a 1000-slot ring, 1000 cached updates.
    pub fn new(market: Market) -> Self {
        Self {
            market,
            timeout: Duration::from_secs(10),
            book_depth: 10,
            book_capacity: 1000,
            cache_capacity: 1000,
        }
    }

    /// Set the HTTP request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the per-side depth limit in ticks
    #[must_use]
    pub fn with_book_depth(mut self, depth: usize) -> Self {
        self.book_depth = depth;
        self
    }

    /// Set the ring-buffer slot count per book
    #[must_use]
    pub fn with_book_capacity(mut self, capacity: usize) -> Self {
        self.book_capacity = capacity;
        self
    }

    /// Set the pending-update cache capacity per book
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Get the market
    pub fn market(&self) -> Market {
        self.market
    }

    /// Get the REST base URL for the configured market
    pub fn rest_base_url(&self) -> &'static str {
        self.market.rest_base_url()
    }

    /// Get the timeout duration
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the per-side depth limit
    pub fn book_depth(&self) -> usize {
        self.book_depth
    }

    /// Get the ring-buffer slot count
    pub fn book_capacity(&self) -> usize {
        self.book_capacity
    }

    /// Get the pending-update cache capacity
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Market::default())
    }
}
