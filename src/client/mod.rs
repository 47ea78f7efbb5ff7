//! API clients for communicating with KuCoin.
//!
//! This module contains:
//!
//! - [`rest`] - HTTP client for the bullet token handshake
//! - [`websocket`] - WebSocket client for the real-time feed

pub mod rest;
pub mod websocket;

pub use rest::{RestClient, WsToken};
pub use websocket::{ReconnectConfig, ReconnectingWebSocket, WebSocketClient};
