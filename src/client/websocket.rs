//! WebSocket client for the real-time KuCoin market data feed.
//!
//! Connections are established with a token from the bullet handshake
//! (see [`RestClient::fetch_token`]). Topics follow the exchange's path
//! form, e.g. `/spotMarket/level2Depth5:BTC-USDT`; [`Instrument::topic`]
//! builds them.
//!
//! [`Instrument::topic`]: crate::types::Instrument::topic
//!
//! # Example
//!
//! ```rust,no_run
//! use kucoin_l2::config::{Config, Market};
//! use kucoin_l2::client::{RestClient, WebSocketClient};
//!
//! # async fn example() -> kucoin_l2::Result<()> {
//! let config = Config::new(Market::Spot);
//! let rest = RestClient::new(&config)?;
//! let token = rest.fetch_token().await?;
//!
//! let mut ws = WebSocketClient::connect(&token).await?;
//! ws.subscribe("/spotMarket/level2Depth5:BTC-USDT").await?;
//!
//! while let Some(msg) = ws.next().await {
//!     let msg = msg?;
//!     // Route to a BookManager here.
//! }
//! # Ok(())
//! # }
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::client::rest::{RestClient, WsToken};
use crate::error::Error;
use crate::types::messages::{WsCommand, WsMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket client for the market data feed
///
/// # Thread Safety
///
/// This client is NOT thread-safe. Drive it from a single task and fan
/// messages out through channels or a shared [`BookManager`].
///
/// [`BookManager`]: crate::orderbook::BookManager
#[derive(Debug)]
pub struct WebSocketClient {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
    message_id: u64,
    ping_interval: Duration,
}

impl WebSocketClient {
    /// Connect to the feed endpoint named by a bullet token.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL is malformed or the
    /// connection handshake fails.
    pub async fn connect(token: &WsToken) -> Result<Self, Error> {
        let url = feed_url(&token.endpoint, &token.token)?;
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
        let (write, read) = ws_stream.split();
        info!(endpoint = %token.endpoint, "websocket connected");

        Ok(Self {
            write,
            read,
            message_id: 1,
            ping_interval: token.ping_interval,
        })
    }

    /// Interval at which the server expects [`ping`](Self::ping) calls
    pub fn ping_interval(&self) -> Duration {
        self.ping_interval
    }

    /// Send a command to the WebSocket server
    async fn send_command(&mut self, cmd: WsCommand) -> Result<u64, Error> {
        let msg_id = self.message_id;
        let json = serde_json::to_string(&cmd)?;
        self.write.send(Message::Text(json)).await?;
        self.message_id += 1;
        Ok(msg_id)
    }

    /// Subscribe to a topic
    ///
    /// # Returns
    ///
    /// The message ID of the request (use to correlate with the ack)
    pub async fn subscribe(&mut self, topic: &str) -> Result<u64, Error> {
        debug!(topic, "subscribing");
        let cmd = WsCommand::Subscribe {
            id: self.message_id,
            topic: topic.to_string(),
            response: true,
        };
        self.send_command(cmd).await
    }

    /// Unsubscribe from a topic
    pub async fn unsubscribe(&mut self, topic: &str) -> Result<u64, Error> {
        debug!(topic, "unsubscribing");
        let cmd = WsCommand::Unsubscribe {
            id: self.message_id,
            topic: topic.to_string(),
            response: true,
        };
        self.send_command(cmd).await
    }

    /// Send an application-level ping
    ///
    /// The server drops connections that go a full ping interval without
    /// one, independent of frame-level keepalive.
    pub async fn ping(&mut self) -> Result<u64, Error> {
        let cmd = WsCommand::Ping {
            id: self.message_id,
        };
        self.send_command(cmd).await
    }

    /// Receive the next message from the WebSocket
    ///
    /// Frame-level pings are answered transparently. Returns `None` when
    /// the stream ends.
    pub async fn next(&mut self) -> Option<Result<WsMessage, Error>> {
        loop {
            match self.read.next().await? {
                Ok(Message::Text(text)) => {
                    return Some(serde_json::from_str(&text).map_err(Error::from));
                }
                Ok(Message::Ping(data)) => {
                    if let Err(e) = self.write.send(Message::Pong(data)).await {
                        return Some(Err(e.into()));
                    }
                }
                Ok(Message::Close(_)) => {
                    return Some(Err(Error::ConnectionClosed));
                }
                Ok(_) => {
                    // Ignore other message types (Binary, Pong, Frame)
                    continue;
                }
                Err(e) => {
                    return Some(Err(e.into()));
                }
            }
        }
    }

    /// Close the WebSocket connection
    pub async fn close(&mut self) -> Result<(), Error> {
        self.write.close().await?;
        Ok(())
    }
}

/// Build the feed URL: the bullet endpoint plus token and connect id
fn feed_url(endpoint: &str, token: &str) -> Result<Url, Error> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| Error::Config(format!("invalid websocket endpoint: {e}")))?;
    url.query_pairs_mut()
        .append_pair("token", token)
        .append_pair("connectId", &connect_id());
    Ok(url)
}

/// Unique-enough connection id required by the handshake URL
fn connect_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("l2-{millis}")
}

/// Configuration for reconnection behavior
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of reconnection attempts (0 = infinite)
    pub max_retries: u32,
    /// Initial delay between reconnection attempts
    pub initial_delay_ms: u64,
    /// Maximum delay between reconnection attempts
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            initial_delay_ms: 100,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Create a new reconnect config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum retries (0 = infinite)
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set initial delay in milliseconds
    pub fn initial_delay_ms(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    /// Set maximum delay in milliseconds
    pub fn max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    /// Set backoff multiplier
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate delay for a given retry attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = delay.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(delay_ms)
    }
}

/// WebSocket client with automatic reconnection support.
///
/// Wraps [`WebSocketClient`] with:
/// - Token re-acquisition (bullet tokens are single-use)
/// - Automatic reconnection with exponential backoff
/// - Topic replay after reconnection
///
/// # Example
///
/// ```rust,no_run
/// use kucoin_l2::config::{Config, Market};
/// use kucoin_l2::client::{ReconnectConfig, ReconnectingWebSocket, RestClient};
///
/// # async fn example() -> kucoin_l2::Result<()> {
/// let config = Config::new(Market::Spot);
/// let rest = RestClient::new(&config)?;
/// let mut ws = ReconnectingWebSocket::connect(rest, ReconnectConfig::default()).await?;
///
/// // Replayed automatically after every reconnect.
/// ws.subscribe("/spotMarket/level2Depth5:BTC-USDT").await?;
///
/// while let Some(msg) = ws.next().await {
///     match msg {
///         Ok(msg) => { /* route to a BookManager */ }
///         Err(e) => eprintln!("feed error: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct ReconnectingWebSocket {
    client: Option<WebSocketClient>,
    rest: RestClient,
    reconnect_config: ReconnectConfig,
    /// Topics to replay after reconnection
    topics: Vec<String>,
    reconnect_attempt: u32,
    is_reconnecting: bool,
}

impl std::fmt::Debug for ReconnectingWebSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectingWebSocket")
            .field("connected", &self.client.is_some())
            .field("reconnect_attempt", &self.reconnect_attempt)
            .field("is_reconnecting", &self.is_reconnecting)
            .field("topic_count", &self.topics.len())
            .finish()
    }
}

impl ReconnectingWebSocket {
    /// Fetch a token and connect to the feed with reconnection support
    pub async fn connect(
        rest: RestClient,
        reconnect_config: ReconnectConfig,
    ) -> Result<Self, Error> {
        let token = rest.fetch_token().await?;
        let client = WebSocketClient::connect(&token).await?;

        Ok(Self {
            client: Some(client),
            rest,
            reconnect_config,
            topics: Vec::new(),
            reconnect_attempt: 0,
            is_reconnecting: false,
        })
    }

    /// Check if currently connected
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Check if currently reconnecting
    pub fn is_reconnecting(&self) -> bool {
        self.is_reconnecting
    }

    /// Get the current reconnection attempt number
    pub fn reconnect_attempt(&self) -> u32 {
        self.reconnect_attempt
    }

    /// Topics currently subscribed (and replayed on reconnect)
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Interval at which the server expects pings, if connected
    pub fn ping_interval(&self) -> Option<Duration> {
        self.client.as_ref().map(WebSocketClient::ping_interval)
    }

    /// Subscribe to a topic
    ///
    /// The subscription is replayed automatically after reconnection.
    pub async fn subscribe(&mut self, topic: &str) -> Result<u64, Error> {
        if !self.topics.iter().any(|t| t == topic) {
            self.topics.push(topic.to_string());
        }

        if let Some(ref mut client) = self.client {
            client.subscribe(topic).await
        } else {
            Err(Error::ConnectionClosed)
        }
    }

    /// Unsubscribe from a topic and stop replaying it
    pub async fn unsubscribe(&mut self, topic: &str) -> Result<u64, Error> {
        self.topics.retain(|t| t != topic);

        if let Some(ref mut client) = self.client {
            client.unsubscribe(topic).await
        } else {
            Err(Error::ConnectionClosed)
        }
    }

    /// Send an application-level ping
    pub async fn ping(&mut self) -> Result<u64, Error> {
        if let Some(ref mut client) = self.client {
            client.ping().await
        } else {
            Err(Error::ConnectionClosed)
        }
    }

    /// Receive the next message, reconnecting if necessary
    ///
    /// On connection loss a fresh token is fetched, the socket is
    /// re-established with exponential backoff, and all topics are
    /// replayed before messages resume.
    pub async fn next(&mut self) -> Option<Result<WsMessage, Error>> {
        loop {
            if let Some(ref mut client) = self.client {
                match client.next().await {
                    Some(Ok(msg)) => {
                        self.reconnect_attempt = 0;
                        return Some(Ok(msg));
                    }
                    Some(Err(Error::ConnectionClosed)) | None => {
                        self.client = None;
                        if let Err(e) = self.attempt_reconnect().await {
                            return Some(Err(e));
                        }
                        continue;
                    }
                    Some(Err(e)) => {
                        return Some(Err(e));
                    }
                }
            } else if let Err(e) = self.attempt_reconnect().await {
                return Some(Err(e));
            }
        }
    }

    /// Attempt to reconnect with exponential backoff
    async fn attempt_reconnect(&mut self) -> Result<(), Error> {
        self.is_reconnecting = true;

        loop {
            if self.reconnect_config.max_retries > 0
                && self.reconnect_attempt >= self.reconnect_config.max_retries
            {
                self.is_reconnecting = false;
                return Err(Error::ConnectionClosed);
            }

            let delay = self
                .reconnect_config
                .delay_for_attempt(self.reconnect_attempt);
            tokio::time::sleep(delay).await;

            self.reconnect_attempt += 1;
            warn!(attempt = self.reconnect_attempt, "reconnecting websocket");

            // The previous token died with the connection.
            let token = match self.rest.fetch_token().await {
                Ok(token) => token,
                Err(_) => continue,
            };

            match WebSocketClient::connect(&token).await {
                Ok(mut client) => {
                    if self.replay_topics(&mut client).await.is_err() {
                        continue;
                    }

                    self.client = Some(client);
                    self.is_reconnecting = false;
                    return Ok(());
                }
                Err(_) => continue,
            }
        }
    }

    /// Replay all saved topics on a new connection
    async fn replay_topics(&self, client: &mut WebSocketClient) -> Result<(), Error> {
        for topic in &self.topics {
            client.subscribe(topic).await?;
        }
        Ok(())
    }

    /// Manually trigger a reconnection
    pub async fn reconnect(&mut self) -> Result<(), Error> {
        if let Some(ref mut client) = self.client {
            let _ = client.close().await;
        }
        self.client = None;
        self.reconnect_attempt = 0;
        self.attempt_reconnect().await
    }

    /// Close the WebSocket connection
    pub async fn close(&mut self) -> Result<(), Error> {
        if let Some(ref mut client) = self.client {
            client.close().await?;
        }
        self.client = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_config_default() {
        let config = ReconnectConfig::default();
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.initial_delay_ms, 100);
        assert_eq!(config.max_delay_ms, 30_000);
        assert!((config.backoff_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reconnect_config_builder() {
        let config = ReconnectConfig::new()
            .max_retries(5)
            .initial_delay_ms(50)
            .max_delay_ms(10_000)
            .backoff_multiplier(1.5);

        assert_eq!(config.max_retries, 5);
        assert_eq!(config.initial_delay_ms, 50);
        assert_eq!(config.max_delay_ms, 10_000);
        assert!((config.backoff_multiplier - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_delay_calculation() {
        let config = ReconnectConfig::new()
            .initial_delay_ms(100)
            .backoff_multiplier(2.0)
            .max_delay_ms(1000);

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(800));
        // Should cap at max_delay_ms
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(10), Duration::from_millis(1000));
    }

    #[test]
    fn test_feed_url() {
        let url = feed_url("wss://ws-api-spot.kucoin.com/", "tok123").unwrap();
        assert_eq!(url.host_str(), Some("ws-api-spot.kucoin.com"));
        let params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(params[0].0, "token");
        assert_eq!(params[0].1, "tok123");
        assert_eq!(params[1].0, "connectId");
    }

    #[test]
    fn test_feed_url_rejects_garbage() {
        assert!(matches!(
            feed_url("not a url", "tok"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_connect_id_format() {
        let id = connect_id();
        assert!(id.starts_with("l2-"));
        assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
    }
}
