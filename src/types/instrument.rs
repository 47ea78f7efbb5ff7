//! Instrument definition and fixed-point conversions.
//!
//! All book arithmetic runs on scaled integers: a decimal price is
//! multiplied by `10^price_scale` and rounded, quantities likewise with
//! `quantity_scale`. The tick size in scaled units anchors the ring
//! buffer's index arithmetic, so it must be strictly positive.

use crate::config::Market;
use crate::error::Error;
use crate::types::{ScaledPrice, ScaledQty};

/// A tradeable instrument with its fixed-point scaling context.
///
/// Immutable once constructed; one instrument backs exactly one book.
///
/// # Example
///
/// ```rust
/// use kucoin_l2::types::Instrument;
/// use kucoin_l2::config::Market;
///
/// let btc = Instrument::new("BTC-USDT", Market::Spot, 2, 8, 0.01, 100_000.0).unwrap();
/// assert_eq!(btc.price_to_scaled(123.45), 12345);
/// assert_eq!(btc.tick_size_scaled(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    symbol: String,
    market: Market,
    price_scale: u32,
    quantity_scale: u32,
    tick_size: f64,
    peg_index_price: f64,
}

impl Instrument {
    /// Create a new instrument.
    ///
    /// # Arguments
    ///
    /// * `symbol` - Exchange symbol, e.g. `BTC-USDT`
    /// * `market` - Spot or futures feed
    /// * `price_scale` / `quantity_scale` - decimal digits of fixed-point precision
    /// * `tick_size` - minimum price increment in decimal units
    /// * `peg_index_price` - reference price anchoring the ring buffer center
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the tick size is not strictly positive
    /// or rounds to zero scaled units; index arithmetic divides by the
    /// scaled tick size and cannot start without a valid one.
    pub fn new(
        symbol: impl Into<String>,
        market: Market,
        price_scale: u32,
        quantity_scale: u32,
        tick_size: f64,
        peg_index_price: f64,
    ) -> Result<Self, Error> {
        if tick_size <= 0.0 {
            return Err(Error::Config(format!(
                "tick size must be positive, got {tick_size}"
            )));
        }
        let instrument = Self {
            symbol: symbol.into(),
            market,
            price_scale,
            quantity_scale,
            tick_size,
            peg_index_price,
        };
        if instrument.tick_size_scaled() == 0 {
            return Err(Error::Config(format!(
                "tick size {tick_size} is below the price scale resolution 1e-{price_scale}"
            )));
        }
        Ok(instrument)
    }

    /// Exchange symbol
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Which feed this instrument trades on
    #[must_use]
    pub fn market(&self) -> Market {
        self.market
    }

    /// Decimal digits of price precision
    #[must_use]
    pub fn price_scale(&self) -> u32 {
        self.price_scale
    }

    /// Decimal digits of quantity precision
    #[must_use]
    pub fn quantity_scale(&self) -> u32 {
        self.quantity_scale
    }

    /// Minimum price increment in decimal units
    #[must_use]
    pub fn tick_size(&self) -> f64 {
        self.tick_size
    }

    /// Reference price anchoring the book's center slot
    #[must_use]
    pub fn peg_index_price(&self) -> f64 {
        self.peg_index_price
    }

    /// Convert a decimal price to scaled integer units
    #[must_use]
    pub fn price_to_scaled(&self, price: f64) -> ScaledPrice {
        (price * 10f64.powi(self.price_scale as i32)).round() as ScaledPrice
    }

    /// Convert a scaled price back to decimal units
    #[must_use]
    pub fn scaled_to_price(&self, price: ScaledPrice) -> f64 {
        price as f64 / 10f64.powi(self.price_scale as i32)
    }

    /// Convert a decimal quantity to scaled integer units
    #[must_use]
    pub fn qty_to_scaled(&self, qty: f64) -> ScaledQty {
        (qty * 10f64.powi(self.quantity_scale as i32)).round() as ScaledQty
    }

    /// Convert a scaled quantity back to decimal units
    #[must_use]
    pub fn scaled_to_qty(&self, qty: ScaledQty) -> f64 {
        qty as f64 / 10f64.powi(self.quantity_scale as i32)
    }

    /// Tick size in scaled price units. Always > 0 for a valid instrument.
    #[must_use]
    pub fn tick_size_scaled(&self) -> ScaledPrice {
        (self.tick_size * 10f64.powi(self.price_scale as i32)).round() as ScaledPrice
    }

    /// Feed subscription topic for this instrument
    #[must_use]
    pub fn topic(&self) -> String {
        format!("{}:{}", self.market.topic_prefix(), self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc() -> Instrument {
        Instrument::new("BTC-USDT", Market::Spot, 2, 8, 0.01, 100_000.0).unwrap()
    }

    #[test]
    fn test_price_rounding_pinned() {
        let instrument = btc();
        assert_eq!(instrument.price_to_scaled(123.45), 12345);
        assert_eq!(instrument.price_to_scaled(123.454), 12345);
        assert_eq!(instrument.price_to_scaled(123.455), 12346);
        assert_eq!(instrument.price_to_scaled(0.0), 0);
    }

    #[test]
    fn test_qty_rounding_pinned() {
        let instrument = btc();
        assert_eq!(instrument.qty_to_scaled(1.5), 150_000_000);
        assert_eq!(instrument.qty_to_scaled(0.000_000_004), 0);
        assert_eq!(instrument.qty_to_scaled(0.000_000_005), 1);
    }

    #[test]
    fn test_tick_size_scaled() {
        assert_eq!(btc().tick_size_scaled(), 1);
        let coarse = Instrument::new("X", Market::Spot, 1, 2, 0.1, 100.0).unwrap();
        assert_eq!(coarse.tick_size_scaled(), 1);
        let wide = Instrument::new("Y", Market::Futures, 2, 2, 0.5, 100.0).unwrap();
        assert_eq!(wide.tick_size_scaled(), 50);
    }

    #[test]
    fn test_round_trip_within_one_unit() {
        let instrument = btc();
        for price in [0.01, 99.99, 123.45, 100_000.0, 68_421.37] {
            let back = instrument.scaled_to_price(instrument.price_to_scaled(price));
            assert!((back - price).abs() <= 0.01, "{price} -> {back}");
        }
        for qty in [0.000_000_01, 1.0, 0.123_456_78] {
            let back = instrument.scaled_to_qty(instrument.qty_to_scaled(qty));
            assert!((back - qty).abs() <= 1e-8, "{qty} -> {back}");
        }
    }

    #[test]
    fn test_invalid_tick_size() {
        assert!(Instrument::new("X", Market::Spot, 2, 2, 0.0, 100.0).is_err());
        assert!(Instrument::new("X", Market::Spot, 2, 2, -0.01, 100.0).is_err());
        // Rounds to zero scaled units
        assert!(Instrument::new("X", Market::Spot, 2, 2, 0.001, 100.0).is_err());
    }

    #[test]
    fn test_topic() {
        assert_eq!(btc().topic(), "/spotMarket/level2Depth5:BTC-USDT");
        let perp = Instrument::new("XBTUSDTM", Market::Futures, 1, 0, 0.1, 100_000.0).unwrap();
        assert_eq!(perp.topic(), "/contractMarket/level2Depth5:XBTUSDTM");
    }
}
