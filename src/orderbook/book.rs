//! Ring-buffer L2 order book.
//!
//! A fixed-capacity circular array of signed quantities holds both book
//! sides: the sign of a slot encodes the side, the magnitude the resting
//! quantity in scaled units. Slot index is derived from the scaled price's
//! tick offset from a peg price anchored at the center slot, wrapped
//! modulo capacity, so the visible window slides with the market without
//! ever reallocating. Updates touch at most one slot plus the slots
//! evicted when the window shifts; the hot path allocates nothing.

use crate::error::Error;
use crate::types::{Instrument, ScaledPrice, ScaledQty, SequenceId, Side};

/// Depth-limited ring-buffer order book for a single instrument.
///
/// # Thread Safety
///
/// `Send + Sync` but not internally synchronized: one writer applies all
/// mutations in feed-arrival order, readers take cloned snapshots (see
/// [`BookManager`](crate::orderbook::BookManager)).
///
/// # Example
///
/// ```rust
/// use kucoin_l2::orderbook::L2Book;
/// use kucoin_l2::types::{Instrument, Side};
/// use kucoin_l2::config::Market;
///
/// let btc = Instrument::new("BTC-USDT", Market::Spot, 2, 2, 0.01, 100_000.0).unwrap();
/// let mut book = L2Book::new(btc.clone(), 20, 100).unwrap();
///
/// book.add(Side::Bid, btc.price_to_scaled(99_999.99), 500, 0, 0);
/// assert_eq!(book.best_bid(), Some(btc.price_to_scaled(99_999.99)));
/// ```
#[derive(Debug, Clone)]
pub struct L2Book {
    instrument: Instrument,
    /// Ticks tracked away from best price, per side
    depth: usize,
    /// Signed quantity per slot; 0 means no resting quantity
    slots: Vec<ScaledQty>,
    /// Fixed slot corresponding to the peg price
    peg_index: usize,
    /// Peg price in scaled units
    peg_price: ScaledPrice,
    best_bid: Option<ScaledPrice>,
    best_ask: Option<ScaledPrice>,
    init_sequence: SequenceId,
    last_sequence_start: SequenceId,
    last_sequence_end: SequenceId,
}

impl L2Book {
    /// Create an empty book.
    ///
    /// # Arguments
    ///
    /// * `instrument` - scaling context; its peg price anchors the center slot
    /// * `depth` - ticks tracked away from best price on either side
    /// * `capacity` - total ring-buffer slot count
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `capacity` is zero; the index
    /// arithmetic needs at least one slot to wrap into.
    pub fn new(instrument: Instrument, depth: usize, capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::Config("book capacity must be non-zero".to_string()));
        }
        let peg_price = instrument.price_to_scaled(instrument.peg_index_price());
        Ok(Self {
            instrument,
            depth,
            slots: vec![0; capacity],
            peg_index: capacity / 2,
            peg_price,
            best_bid: None,
            best_ask: None,
            init_sequence: 0,
            last_sequence_start: 0,
            last_sequence_end: 0,
        })
    }

    /// The instrument this book tracks
    #[must_use]
    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Per-side depth limit in ticks
    #[must_use]
    pub const fn depth_limit(&self) -> usize {
        self.depth
    }

    /// Total ring-buffer slot count
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// True once at least one non-zero sequence window has been recorded
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.init_sequence > 0
    }

    /// Sequence that initialized the book
    #[must_use]
    pub const fn init_sequence(&self) -> SequenceId {
        self.init_sequence
    }

    /// Start of the last applied sequence window
    #[must_use]
    pub const fn last_sequence_start(&self) -> SequenceId {
        self.last_sequence_start
    }

    /// End of the last applied sequence window
    #[must_use]
    pub const fn last_sequence_end(&self) -> SequenceId {
        self.last_sequence_end
    }

    /// Apply a single price-level update.
    ///
    /// The first observation on a side seeds that side's best price.
    /// Prices farther than the depth limit from the side's best are a
    /// defined no-op. Otherwise the level is written and the side's best
    /// pointer maintained: a zero quantity at the best retreats it to the
    /// next resting level, a strictly better price advances it, evicting
    /// the slots that fall out of the tracked band as the window slides.
    ///
    /// Pass a zero sequence window for unsequenced (seeding) updates; the
    /// first non-zero window latches the book as initialized.
    pub fn add(
        &mut self,
        side: Side,
        price: ScaledPrice,
        quantity: ScaledQty,
        sequence_start: SequenceId,
        sequence_end: SequenceId,
    ) {
        match side {
            Side::Bid if self.best_bid.is_none() => self.best_bid = Some(price),
            Side::Ask if self.best_ask.is_none() => self.best_ask = Some(price),
            _ => {}
        }
        if self.outside_depth(side, price) {
            return;
        }

        let index = self.to_index(price);
        self.set_slot(index, side, quantity);

        match side {
            Side::Bid => self.update_bid_bounds(price, quantity),
            Side::Ask => self.update_ask_bounds(price, quantity),
        }

        if self.last_sequence_end == 0 {
            self.init_sequence = sequence_start;
        }
        self.last_sequence_start = sequence_start;
        self.last_sequence_end = sequence_end;
    }

    fn update_bid_bounds(&mut self, price: ScaledPrice, quantity: ScaledQty) {
        let tick = self.instrument.tick_size_scaled();
        let Some(best) = self.best_bid else { return };

        if quantity == 0 && best == price {
            // Retreat to the next resting level below, bounded by one
            // full rotation of the buffer.
            let mut best = best;
            for _ in 0..self.slots.len() {
                if self.slots[self.to_index(best)] != 0 {
                    break;
                }
                best -= tick;
            }
            self.best_bid = Some(best);
        } else if price > best {
            // Advance: evict the slots sliding out of the tracked band,
            // one tick at a time, so stale quantities cannot re-enter the
            // window once the index wraps.
            // The old trailing edge itself (exactly depth ticks behind the
            // old best) is in band and leaves the window first.
            let ticks_jump = ((price - best) / tick) as usize;
            let mut trailing = self.norm_index(self.to_index(best) as i64 - self.depth as i64);
            for _ in 0..ticks_jump {
                self.slots[trailing] = 0;
                trailing = self.one_right(trailing);
            }
            self.best_bid = Some(price);
        }
    }

    fn update_ask_bounds(&mut self, price: ScaledPrice, quantity: ScaledQty) {
        let tick = self.instrument.tick_size_scaled();
        let Some(best) = self.best_ask else { return };

        if quantity == 0 && best == price {
            let mut best = best;
            for _ in 0..self.slots.len() {
                if self.slots[self.to_index(best)] != 0 {
                    break;
                }
                best += tick;
            }
            self.best_ask = Some(best);
        } else if price < best {
            let ticks_drop = ((best - price) / tick) as usize;
            let mut trailing = self.norm_index(self.to_index(best) as i64 + self.depth as i64);
            for _ in 0..ticks_drop {
                self.slots[trailing] = 0;
                trailing = self.one_left(trailing);
            }
            self.best_ask = Some(price);
        }
    }

    fn outside_depth(&self, side: Side, price: ScaledPrice) -> bool {
        let tick = self.instrument.tick_size_scaled();
        let depth = self.depth as i64;
        match side {
            Side::Bid => self
                .best_bid
                .is_some_and(|best| (best - price).abs() / tick > depth),
            Side::Ask => self
                .best_ask
                .is_some_and(|best| (price - best).abs() / tick > depth),
        }
    }

    /// Map an absolute scaled price to its ring-buffer slot.
    ///
    /// All read and write paths go through this single translation.
    #[must_use]
    pub fn to_index(&self, price: ScaledPrice) -> usize {
        let offset = (price - self.peg_price) / self.instrument.tick_size_scaled();
        self.norm_index(self.peg_index as i64 + offset)
    }

    /// Reduce a raw index into `[0, capacity)`, wrapping negative offsets forward
    fn norm_index(&self, raw: i64) -> usize {
        let len = self.slots.len() as i64;
        let norm = raw % len;
        (if norm < 0 { norm + len } else { norm }) as usize
    }

    fn one_left(&self, index: usize) -> usize {
        if index > 0 {
            index - 1
        } else {
            self.slots.len() - 1
        }
    }

    fn one_right(&self, index: usize) -> usize {
        if index + 1 == self.slots.len() {
            0
        } else {
            index + 1
        }
    }

    /// Single slot write site; the sign invariant is enforced here and
    /// raw signed values never leave the book.
    fn set_slot(&mut self, index: usize, side: Side, quantity: ScaledQty) {
        self.slots[index] = side.sign() * quantity.abs();
    }

    /// Best bid price in scaled units, `None` before the first bid
    #[must_use]
    pub const fn best_bid(&self) -> Option<ScaledPrice> {
        self.best_bid
    }

    /// Best ask price in scaled units, `None` before the first ask
    #[must_use]
    pub const fn best_ask(&self) -> Option<ScaledPrice> {
        self.best_ask
    }

    /// Resting quantity at the best bid (0 when unseeded)
    #[must_use]
    pub fn best_bid_qty(&self) -> ScaledQty {
        self.best_bid.map_or(0, |p| self.qty_at(p))
    }

    /// Resting quantity at the best ask (0 when unseeded)
    #[must_use]
    pub fn best_ask_qty(&self) -> ScaledQty {
        self.best_ask.map_or(0, |p| self.qty_at(p))
    }

    /// Resting quantity magnitude at a scaled price
    #[must_use]
    pub fn qty_at(&self, price: ScaledPrice) -> ScaledQty {
        self.slots[self.to_index(price)].abs()
    }

    /// Which side, if any, rests at a scaled price
    #[must_use]
    pub fn side_at(&self, price: ScaledPrice) -> Option<Side> {
        let slot = self.slots[self.to_index(price)];
        if slot == 0 {
            None
        } else {
            Side::try_from_sign(slot.signum()).ok()
        }
    }

    /// Resting quantity `levels` ticks away from the side's best price
    #[must_use]
    pub fn qty_at_depth(&self, side: Side, levels: usize) -> ScaledQty {
        let tick = self.instrument.tick_size_scaled();
        let price = match side {
            Side::Bid => self.best_bid.map(|best| best - levels as i64 * tick),
            Side::Ask => self.best_ask.map(|best| best + levels as i64 * tick),
        };
        price.map_or(0, |p| self.qty_at(p))
    }

    /// Bid ladder: `(decimal price, decimal quantity)` pairs walking down
    /// from the best bid for the depth limit, zero levels included so
    /// consumers can render a stable ladder. Empty before the first bid.
    pub fn bids(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let tick = self.instrument.tick_size_scaled();
        let best = self.best_bid;
        (0..self.depth).filter_map(move |level| {
            let price = best? - level as i64 * tick;
            Some((
                self.instrument.scaled_to_price(price),
                self.instrument.scaled_to_qty(self.qty_at(price)),
            ))
        })
    }

    /// Ask ladder: pairs walking up from the best ask, mirror of [`Self::bids`]
    pub fn asks(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let tick = self.instrument.tick_size_scaled();
        let best = self.best_ask;
        (0..self.depth).filter_map(move |level| {
            let price = best? + level as i64 * tick;
            Some((
                self.instrument.scaled_to_price(price),
                self.instrument.scaled_to_qty(self.qty_at(price)),
            ))
        })
    }

    /// Mid price in decimal units, `None` until both sides are seeded
    #[must_use]
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => {
                Some((self.instrument.scaled_to_price(bid) + self.instrument.scaled_to_price(ask)) / 2.0)
            }
            _ => None,
        }
    }

    /// Spread in scaled price units, `None` until both sides are seeded
    #[must_use]
    pub fn spread(&self) -> Option<ScaledPrice> {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }
}
