//! Core types for the market-data client.
//!
//! - [`side`] - Quote side with sign encoding
//! - [`instrument`] - Instrument scaling context and fixed-point conversions
//! - [`messages`] - WebSocket wire types

pub mod instrument;
pub mod messages;
pub mod side;

pub use instrument::Instrument;
pub use messages::WsMessage;
pub use side::Side;

/// Price in scaled integer units (`decimal * 10^price_scale`, rounded)
///
/// Signed: prices below the peg produce negative ring offsets that index
/// normalization wraps forward.
pub type ScaledPrice = i64;

/// Quantity in scaled integer units (`decimal * 10^quantity_scale`, rounded)
///
/// Signed because book slots store `side.sign() * |qty|`.
pub type ScaledQty = i64;

/// Position of a feed update in the source's update stream
pub type SequenceId = u64;
