//! Sequence reconciliation for out-of-order feed deltas.
//!
//! A live feed can deliver bursts whose sequence numbers race ahead of or
//! lag the book's last-applied window, e.g. while a snapshot is being
//! applied. Buffering decouples arrival order from applicability order:
//! events wait here until sequence continuity with the book can be
//! established, then replay in arrival order. This is best-effort
//! reconciliation, not a retry queue; an event found inadmissible during a
//! drain is dropped for good.

use std::collections::VecDeque;

use tracing::debug;

use crate::orderbook::L2Book;
use crate::types::{ScaledPrice, ScaledQty, SequenceId, Side};

/// A buffered price-level update awaiting sequence continuity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingUpdate {
    /// Side the update applies to
    pub side: Side,
    /// Price in scaled units
    pub price: ScaledPrice,
    /// Quantity in scaled units
    pub qty: ScaledQty,
    /// First sequence covered by the update
    pub sequence_start: SequenceId,
    /// Last sequence covered by the update
    pub sequence_end: SequenceId,
}

/// Bounded FIFO of pending book updates.
///
/// Events append at the tail and drain from the head; each carries its own
/// side tag so replay always lands the event on the side it came from.
/// When the queue is full the oldest event is evicted, bounding memory on
/// a feed that outruns the book.
#[derive(Debug, Clone)]
pub struct UpdateCache {
    events: VecDeque<PendingUpdate>,
    capacity: usize,
}

impl UpdateCache {
    /// Default event capacity, matching the reference deployment
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Create a cache bounded at [`Self::DEFAULT_CAPACITY`] events
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a cache bounded at `capacity` events
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// True when no events are buffered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of buffered events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Append one event at the tail, evicting the oldest when full
    pub fn push(
        &mut self,
        side: Side,
        price: ScaledPrice,
        qty: ScaledQty,
        sequence_start: SequenceId,
        sequence_end: SequenceId,
    ) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(PendingUpdate {
            side,
            price,
            qty,
            sequence_start,
            sequence_end,
        });
    }

    /// Drain the queue into `book`, oldest first.
    ///
    /// An event is admissible only when it is contiguous with the book's
    /// sequence window (`sequence_start <= last_sequence_end + 1`) and not
    /// stale (`sequence_end > last_sequence_end`). Levels split out of one
    /// feed message share a window, so the admissibility decision is made
    /// once per distinct window, against the book's window as it stood
    /// when that window was first seen; applying the first level must not
    /// render its siblings stale. Admissible events apply with their own
    /// window, advancing the book; the rest are dropped silently and never
    /// revisited. Terminates once the queue is empty.
    pub fn drain_into(&mut self, book: &mut L2Book) {
        let mut decided: Option<((SequenceId, SequenceId), bool)> = None;
        while let Some(event) = self.events.pop_front() {
            let window = (event.sequence_start, event.sequence_end);
            let admit = match decided {
                Some((seen, admit)) if seen == window => admit,
                _ => {
                    let applied_through = book.last_sequence_end();
                    let admit = event.sequence_start <= applied_through + 1
                        && event.sequence_end > applied_through;
                    decided = Some((window, admit));
                    admit
                }
            };
            if admit {
                book.add(
                    event.side,
                    event.price,
                    event.qty,
                    event.sequence_start,
                    event.sequence_end,
                );
            } else {
                debug!(
                    sequence_start = event.sequence_start,
                    sequence_end = event.sequence_end,
                    applied_through = book.last_sequence_end(),
                    "dropping out-of-sequence update"
                );
            }
        }
    }
}

impl Default for UpdateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Market;
    use crate::types::Instrument;

    fn book() -> L2Book {
        let instrument =
            Instrument::new("BTC-USD", Market::Spot, 2, 2, 0.01, 100_000.0).unwrap();
        L2Book::new(instrument, 20, 100).unwrap()
    }

    /// Seed both sides and latch the book at sequence window [1, 10].
    fn initialized_book() -> (L2Book, ScaledPrice) {
        let mut book = book();
        let peg = book.instrument().price_to_scaled(100_000.0);
        book.add(Side::Bid, peg - 1, 100, 1, 10);
        book.add(Side::Ask, peg + 1, 100, 1, 10);
        (book, peg)
    }

    #[test]
    fn test_contiguous_event_applied_once() {
        let (mut book, peg) = initialized_book();
        let mut cache = UpdateCache::new();

        cache.push(Side::Bid, peg - 2, 250, 11, 12);
        cache.drain_into(&mut book);

        assert_eq!(book.qty_at(peg - 2), 250);
        assert_eq!(book.last_sequence_end(), 12);
        assert!(cache.is_empty());

        // Replaying the same window again is stale and must not reapply.
        cache.push(Side::Bid, peg - 2, 999, 11, 12);
        cache.drain_into(&mut book);
        assert_eq!(book.qty_at(peg - 2), 250);
        assert_eq!(book.last_sequence_end(), 12);
    }

    #[test]
    fn test_overlapping_window_admissible() {
        let (mut book, peg) = initialized_book();
        let mut cache = UpdateCache::new();

        // Starts inside the applied window but extends beyond it.
        cache.push(Side::Ask, peg + 2, 300, 8, 14);
        cache.drain_into(&mut book);

        assert_eq!(book.qty_at(peg + 2), 300);
        assert_eq!(book.last_sequence_end(), 14);
    }

    #[test]
    fn test_gap_discarded() {
        let (mut book, peg) = initialized_book();
        let mut cache = UpdateCache::new();

        // last_sequence_end is 10; a start of 12 leaves sequence 11 unseen.
        cache.push(Side::Bid, peg - 2, 250, 12, 13);
        cache.drain_into(&mut book);

        assert_eq!(book.qty_at(peg - 2), 0);
        assert_eq!(book.last_sequence_end(), 10);
        assert!(cache.is_empty(), "discarded events are not retried");
    }

    #[test]
    fn test_stale_discarded() {
        let (mut book, peg) = initialized_book();
        let mut cache = UpdateCache::new();

        cache.push(Side::Bid, peg - 2, 250, 5, 10);
        cache.drain_into(&mut book);

        assert_eq!(book.qty_at(peg - 2), 0);
        assert_eq!(book.last_sequence_end(), 10);
    }

    #[test]
    fn test_shared_window_applies_all_levels() {
        let (mut book, peg) = initialized_book();
        let mut cache = UpdateCache::new();

        // Three levels from one feed message share its window; applying
        // the first must not make the siblings look stale.
        cache.push(Side::Bid, peg - 2, 200, 11, 12);
        cache.push(Side::Bid, peg - 3, 300, 11, 12);
        cache.push(Side::Ask, peg + 2, 400, 11, 12);
        cache.drain_into(&mut book);

        assert_eq!(book.qty_at(peg - 2), 200);
        assert_eq!(book.qty_at(peg - 3), 300);
        assert_eq!(book.qty_at(peg + 2), 400);
        assert_eq!(book.last_sequence_end(), 12);

        // The same window arriving again later is stale as a whole.
        cache.push(Side::Bid, peg - 2, 999, 11, 12);
        cache.push(Side::Bid, peg - 3, 999, 11, 12);
        cache.drain_into(&mut book);
        assert_eq!(book.qty_at(peg - 2), 200);
        assert_eq!(book.qty_at(peg - 3), 300);
    }

    #[test]
    fn test_fifo_replay_order() {
        let (mut book, peg) = initialized_book();
        let mut cache = UpdateCache::new();

        // Two updates to the same level; the later arrival must win.
        cache.push(Side::Bid, peg - 2, 100, 11, 11);
        cache.push(Side::Bid, peg - 2, 200, 12, 12);
        cache.drain_into(&mut book);

        assert_eq!(book.qty_at(peg - 2), 200);
        assert_eq!(book.last_sequence_end(), 12);
    }

    #[test]
    fn test_ask_event_lands_on_ask_side() {
        let (mut book, peg) = initialized_book();
        let mut cache = UpdateCache::new();

        cache.push(Side::Ask, peg + 3, 400, 11, 11);
        cache.drain_into(&mut book);

        assert_eq!(book.qty_at(peg + 3), 400);
        assert_eq!(book.side_at(peg + 3), Some(Side::Ask));
    }

    #[test]
    fn test_gap_then_recovery() {
        let (mut book, peg) = initialized_book();
        let mut cache = UpdateCache::new();

        // The gapped event is lost, but a later contiguous one still applies.
        cache.push(Side::Bid, peg - 2, 100, 15, 16);
        cache.push(Side::Bid, peg - 3, 100, 11, 20);
        cache.drain_into(&mut book);

        assert_eq!(book.qty_at(peg - 2), 0);
        assert_eq!(book.qty_at(peg - 3), 100);
        assert_eq!(book.last_sequence_end(), 20);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let (_, peg) = initialized_book();
        let mut cache = UpdateCache::with_capacity(2);

        cache.push(Side::Bid, peg - 1, 1, 11, 11);
        cache.push(Side::Bid, peg - 2, 2, 12, 12);
        cache.push(Side::Bid, peg - 3, 3, 13, 13);

        assert_eq!(cache.len(), 2);
        let (mut book, _) = initialized_book();
        cache.drain_into(&mut book);
        // The first event fell off, so 11 was never applied and 12 gaps out.
        assert_eq!(book.qty_at(peg - 2), 0);
        assert_eq!(book.qty_at(peg - 3), 0);
        assert_eq!(book.last_sequence_end(), 10);
    }
}
