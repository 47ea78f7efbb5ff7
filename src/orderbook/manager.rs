//! Book manager: per-instrument books with feed message routing.
//!
//! One [`BookManager`] owns the book and pending-update cache for every
//! subscribed instrument and routes parsed feed messages to them.
//!
//! # Message handling
//!
//! Book state decides the route. Until a snapshot has initialized the
//! book, delta pairs are applied directly with a zero sequence window;
//! there is no prior window to check against, so no gap detection applies.
//! Once initialized, delta pairs go through the update cache, which is
//! drained immediately and enforces sequence continuity. A snapshot
//! message seeds levels directly with its own window, bypassing the
//! cache, (re)establishing the baseline after a resubscription.
//!
//! # Thread Safety
//!
//! Safe to share as `Arc<BookManager>`: a single dispatcher thread drives
//! `process_message` while readers take cloned book snapshots, never
//! aliasing live slots. Entries sit behind `parking_lot::RwLock`.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Error;
use crate::types::messages::{FeedMessage, WsMessage};
use crate::types::{Instrument, ScaledPrice, Side};

use super::{L2Book, UpdateCache};

/// Message subject carrying level-2 book updates
const L2_UPDATE_SUBJECT: &str = "trade.l2update";

/// Feed-specific marker tagging a full book snapshot
const SNAPSHOT_CODE: &str = "2000";

#[derive(Debug)]
struct BookEntry {
    book: L2Book,
    cache: UpdateCache,
}

/// Manager for the books of all subscribed instruments.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use kucoin_l2::config::{Config, Market};
/// use kucoin_l2::orderbook::BookManager;
/// use kucoin_l2::types::Instrument;
///
/// # fn example() -> kucoin_l2::Result<()> {
/// let manager = Arc::new(BookManager::new(Config::new(Market::Spot)));
/// let btc = Instrument::new("BTC-USDT", Market::Spot, 2, 8, 0.01, 100_000.0)?;
/// manager.add_instrument(btc)?;
///
/// // In the dispatcher loop: manager.process_message(&ws_message);
///
/// if let Some(best) = manager.best_bid("BTC-USDT") {
///     println!("best bid (scaled): {best}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BookManager {
    config: Config,
    books: RwLock<FxHashMap<String, RwLock<BookEntry>>>,
}

impl BookManager {
    /// Create a manager; book depth/capacity come from `config`
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            books: RwLock::new(FxHashMap::default()),
        }
    }

    /// Start tracking an instrument.
    ///
    /// Creates the book and cache exactly once; calling again for the
    /// same symbol is a no-op, so the pair survives transport reconnects
    /// and the snapshot-seeding phase reconciles the fresh feed against
    /// existing state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the book cannot establish valid
    /// index arithmetic for the instrument.
    pub fn add_instrument(&self, instrument: Instrument) -> Result<(), Error> {
        let symbol = instrument.symbol().to_string();
        let mut books = self.books.write();
        if books.contains_key(&symbol) {
            return Ok(());
        }
        let book = L2Book::new(
            instrument,
            self.config.book_depth(),
            self.config.book_capacity(),
        )?;
        let cache = UpdateCache::with_capacity(self.config.cache_capacity());
        info!(symbol = %symbol, depth = self.config.book_depth(), "tracking instrument");
        books.insert(symbol, RwLock::new(BookEntry { book, cache }));
        Ok(())
    }

    /// Stop tracking an instrument, discarding its book and cache
    pub fn remove_instrument(&self, symbol: &str) {
        self.books.write().remove(symbol);
    }

    /// Number of tracked instruments
    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    /// True when no instruments are tracked
    pub fn is_empty(&self) -> bool {
        self.books.read().is_empty()
    }

    /// Symbols of all tracked instruments
    pub fn symbols(&self) -> Vec<String> {
        self.books.read().keys().cloned().collect()
    }

    /// Cloned snapshot of an instrument's book, safe to read lock-free
    pub fn book(&self, symbol: &str) -> Option<L2Book> {
        let books = self.books.read();
        books.get(symbol).map(|entry| entry.read().book.clone())
    }

    /// Best bid in scaled units
    pub fn best_bid(&self, symbol: &str) -> Option<ScaledPrice> {
        let books = self.books.read();
        books.get(symbol).and_then(|entry| entry.read().book.best_bid())
    }

    /// Best ask in scaled units
    pub fn best_ask(&self, symbol: &str) -> Option<ScaledPrice> {
        let books = self.books.read();
        books.get(symbol).and_then(|entry| entry.read().book.best_ask())
    }

    /// Mid price in decimal units
    pub fn mid_price(&self, symbol: &str) -> Option<f64> {
        let books = self.books.read();
        books.get(symbol).and_then(|entry| entry.read().book.mid_price())
    }

    /// Spread in scaled units
    pub fn spread(&self, symbol: &str) -> Option<ScaledPrice> {
        let books = self.books.read();
        books.get(symbol).and_then(|entry| entry.read().book.spread())
    }

    /// Depth ladders as `(bids, asks)` of decimal `(price, qty)` pairs,
    /// most aggressive price first, one entry per tick out to the depth limit
    pub fn depth(&self, symbol: &str) -> Option<(Vec<(f64, f64)>, Vec<(f64, f64)>)> {
        let books = self.books.read();
        let entry = books.get(symbol)?.read();
        Some((entry.book.bids().collect(), entry.book.asks().collect()))
    }

    /// Process one WebSocket message.
    ///
    /// Returns the symbol whose book was touched, or `None` when the
    /// message carried no book data (acks, pongs, unknown subjects,
    /// untracked symbols). Malformed levels and sequence discontinuities
    /// are not errors; they are dropped per the book's contract.
    pub fn process_message(&self, message: &WsMessage) -> Option<String> {
        let WsMessage::Message(feed) = message else {
            return None;
        };
        if feed.subject != L2_UPDATE_SUBJECT {
            return None;
        }
        let Some(symbol) = feed.symbol() else {
            return None;
        };

        let books = self.books.read();
        let Some(entry) = books.get(symbol) else {
            debug!(symbol, "level-2 update for untracked symbol");
            return None;
        };
        Self::apply_feed(&mut entry.write(), feed);
        Some(symbol.to_string())
    }

    fn apply_feed(entry: &mut BookEntry, feed: &FeedMessage) {
        let data = &feed.data;
        let instrument = entry.book.instrument().clone();

        if let Some(changes) = &data.changes {
            let sides = [(Side::Bid, &changes.bids), (Side::Ask, &changes.asks)];
            if entry.book.is_initialized() {
                for (side, levels) in sides {
                    for level in levels {
                        if let Some((price, qty)) = parse_level(level) {
                            entry.cache.push(
                                side,
                                instrument.price_to_scaled(price),
                                instrument.qty_to_scaled(qty),
                                data.sequence_start,
                                data.sequence_end,
                            );
                        }
                    }
                }
                let BookEntry { book, cache } = entry;
                cache.drain_into(book);
            } else {
                // Snapshot-seeding phase: apply directly with a zero
                // window; there is no prior sequence to compare against.
                for (side, levels) in sides {
                    for level in levels {
                        if let Some((price, qty)) = parse_level(level) {
                            entry.book.add(
                                side,
                                instrument.price_to_scaled(price),
                                instrument.qty_to_scaled(qty),
                                0,
                                0,
                            );
                        }
                    }
                }
            }
        }

        if feed.code.as_deref() == Some(SNAPSHOT_CODE) {
            for (side, levels) in [(Side::Bid, &data.bids), (Side::Ask, &data.asks)] {
                for level in levels {
                    if let Some((price, qty)) = parse_level(level) {
                        entry.book.add(
                            side,
                            instrument.price_to_scaled(price),
                            instrument.qty_to_scaled(qty),
                            data.sequence_start,
                            data.sequence_end,
                        );
                    }
                }
            }
        }
    }
}

/// Parse a `["price", "size", ...]` wire entry; malformed entries yield `None`
fn parse_level(level: &[String]) -> Option<(f64, f64)> {
    let price = level.first()?.parse().ok()?;
    let qty = level.get(1)?.parse().ok()?;
    Some((price, qty))
}
