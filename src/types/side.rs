//! Quote side with sign encoding.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Side of the book a quote rests on.
///
/// Each side carries a sign multiplier (+1 for bids, -1 for asks) that the
/// book uses to store both sides in a single quantity array: the sign of a
/// slot encodes the side, the magnitude the resting quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy side (higher price is better)
    Bid,
    /// Sell side (lower price is better)
    Ask,
}

impl Side {
    /// Sign multiplier applied to stored quantities
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Side::Bid => 1,
            Side::Ask => -1,
        }
    }

    /// Get the opposite side
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Decode a side from a raw sign value.
    ///
    /// Zero has no sign and is rejected as a contract violation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSideSign`] when `sign == 0`.
    pub fn try_from_sign(sign: i64) -> Result<Self, Error> {
        match sign {
            0 => Err(Error::InvalidSideSign(0)),
            s if s > 0 => Ok(Side::Bid),
            _ => Ok(Side::Ask),
        }
    }
}
