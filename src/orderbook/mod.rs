//! Level-2 order book maintenance.
//!
//! Three layers build on each other:
//!
//! - [`L2Book`]: a fixed-capacity ring buffer of price levels, both sides
//!   in one sign-encoded array, depth-limited around the best prices
//! - [`UpdateCache`]: a bounded queue for deltas that arrive before the
//!   book has caught up to their sequence window
//! - [`BookManager`]: per-instrument books plus the routing that decides
//!   whether a feed message seeds, caches, or is dropped

mod book;
mod cache;
mod manager;

pub use book::L2Book;
pub use cache::{PendingUpdate, UpdateCache};
pub use manager::BookManager;
