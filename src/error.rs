//! Error types for the kucoin-l2 crate.
//!
//! Only transport failures, bad configuration, and programmer misuse are
//! errors. Data-continuity conditions on the feed (sequence gaps, stale
//! updates, prices outside the tracked depth band) are expected in a live
//! stream and handled as defined no-ops, never surfaced here.

use thiserror::Error;

/// The main error type for this crate
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration (bad tick size, zero capacity, malformed URL)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API returned a non-success code
    #[error("API error ({code}): {message}")]
    Api {
        /// KuCoin API code, `"200000"` on success
        code: String,
        /// Error description from the response body
        message: String,
    },

    /// Token acquisition exhausted its retry budget
    #[error("Token acquisition failed: {0}")]
    Token(String),

    /// WebSocket connection closed unexpectedly
    #[error("WebSocket connection closed")]
    ConnectionClosed,

    /// A side was constructed from a sign of zero
    #[error("Invalid side sign: {0}")]
    InvalidSideSign(i64),

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Error::Api {
            code: "400100".to_string(),
            message: "symbol not found".to_string(),
        };
        assert!(err.to_string().contains("400100"));
        assert!(err.to_string().contains("symbol not found"));
    }

    #[test]
    fn test_invalid_side_sign_display() {
        assert_eq!(Error::InvalidSideSign(0).to_string(), "Invalid side sign: 0");
    }

    #[test]
    fn test_json_error_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(std::error::Error::source(&err).is_some());
    }
}
