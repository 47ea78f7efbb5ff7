//! WebSocket message types.
//!
//! This module contains types for commands sent to the KuCoin WebSocket
//! gateway and messages received from it. Price and size fields arrive as
//! decimal strings inside two-element (or, on some feeds, three-element)
//! arrays; they stay as strings here and are parsed at the routing layer.

use serde::{Deserialize, Serialize};

/// Command sent to the WebSocket gateway
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WsCommand {
    /// Subscribe to a topic
    Subscribe {
        /// Message ID
        id: u64,
        /// Topic, e.g. `/spotMarket/level2Depth5:BTC-USDT`
        topic: String,
        /// Request an ack from the server
        response: bool,
    },
    /// Unsubscribe from a topic
    Unsubscribe {
        /// Message ID
        id: u64,
        /// Topic to drop
        topic: String,
        /// Request an ack from the server
        response: bool,
    },
    /// Application-level keepalive
    Ping {
        /// Message ID
        id: u64,
    },
}

/// Message received from the WebSocket gateway
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WsMessage {
    /// Sent once after connecting
    Welcome {
        /// Connection ID assigned by the gateway
        id: Option<String>,
    },
    /// Subscribe/unsubscribe acknowledged
    Ack {
        /// Message ID (matches the request)
        id: Option<String>,
    },
    /// Keepalive response
    Pong {
        /// Message ID (matches the ping)
        id: Option<String>,
    },
    /// Error response
    Error {
        /// Message ID (matches the request, if any)
        id: Option<String>,
        /// Gateway error code
        code: Option<u32>,
        /// Error description
        data: Option<String>,
    },
    /// Topic data push
    Message(FeedMessage),
}

/// A data push on a subscribed topic
#[derive(Debug, Clone, Deserialize)]
pub struct FeedMessage {
    /// Topic the push belongs to, `{prefix}:{symbol}`
    pub topic: String,
    /// Message subject; `trade.l2update` carries book deltas
    pub subject: String,
    /// Feed-specific marker; `"2000"` tags a full book snapshot
    #[serde(default)]
    pub code: Option<String>,
    /// Level-2 payload
    #[serde(default)]
    pub data: L2Data,
}

impl FeedMessage {
    /// Symbol the push refers to: the payload's own field when present,
    /// otherwise the topic suffix.
    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        self.data
            .symbol
            .as_deref()
            .or_else(|| self.topic.split_once(':').map(|(_, s)| s))
    }
}

/// Level-2 payload of a feed push.
///
/// Delta messages populate `changes` with per-side price/size pairs and a
/// `[sequence_start, sequence_end]` window; snapshot messages populate the
/// top-level `bids`/`asks` ladders instead. Both are zero/empty when absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct L2Data {
    /// First sequence covered by this update (0 when absent)
    #[serde(default, rename = "sequenceStart")]
    pub sequence_start: u64,
    /// Last sequence covered by this update (0 when absent)
    #[serde(default, rename = "sequenceEnd")]
    pub sequence_end: u64,
    /// Symbol, when the payload carries it
    #[serde(default)]
    pub symbol: Option<String>,
    /// Incremental per-side changes (delta messages)
    #[serde(default)]
    pub changes: Option<L2Changes>,
    /// Full bid ladder (snapshot messages)
    #[serde(default)]
    pub bids: Vec<Vec<String>>,
    /// Full ask ladder (snapshot messages)
    #[serde(default)]
    pub asks: Vec<Vec<String>>,
}

/// Per-side price/size change lists of a delta message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct L2Changes {
    /// Bid changes: `[["price", "size", ...], ...]`
    #[serde(default)]
    pub bids: Vec<Vec<String>>,
    /// Ask changes: `[["price", "size", ...], ...]`
    #[serde(default)]
    pub asks: Vec<Vec<String>>,
}
